use serde::{Deserialize, Serialize};

/// A comment as delivered by the flat feed, before thread stitching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatComment {
    pub id: i64,
    pub author: String,
    pub userpic: String,
    pub time: String,
    pub content: String,
}

/// Structural neighbours of a comment, as delivered by the threaded feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreadLinks {
    pub above: i64,
    pub below: i64,
    pub parent: i64,
}

/// A fully stitched comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Comment {
    pub id: i64,
    pub author: String,
    pub userpic: String,
    pub time: String,
    pub content: String,
    pub above: i64,
    pub below: i64,
    pub parent: i64,
}

impl Comment {
    /// Joins flat-feed content with its threaded-feed position
    pub fn stitched(flat: FlatComment, links: ThreadLinks) -> Self {
        Self {
            id: flat.id,
            author: flat.author,
            userpic: flat.userpic,
            time: flat.time,
            content: flat.content,
            above: links.above,
            below: links.below,
            parent: links.parent,
        }
    }
}
