use crate::journal::Comment;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Privacy {
    #[default]
    #[serde(rename = "public")]
    Public,
    #[serde(rename = "private")]
    Private,
    #[serde(rename = "friends-only")]
    FriendsOnly,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::FriendsOnly => "friends-only",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            "friends-only" => Some(Self::FriendsOnly),
            _ => None,
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One archived journal entry
///
/// `time` is kept exactly as displayed on the page. Optional metadata that is
/// absent from the page is stored as an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Post {
    pub id: String,
    pub url: String,
    pub author: String,
    pub time: String,
    pub userpic: String,
    pub privacy: Privacy,
    pub subject: String,
    pub location: String,
    pub mood: String,
    pub mood_image: String,
    pub music: String,
    pub content: String,
    pub comments: Vec<Comment>,

    /// Raw page source, only kept when source capture is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl Post {
    pub fn new(id: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            url: url.to_string(),
            ..Self::default()
        }
    }
}
