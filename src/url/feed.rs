/// Which variant of the comment feed to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedMode {
    /// Full comment content, no thread structure
    Flat,
    /// Thread structure (`above`/`below`/`parent`) only
    Threaded,
}

impl FeedMode {
    /// Value of the `flat` query parameter
    pub fn flag(&self) -> u8 {
        match self {
            Self::Flat => 1,
            Self::Threaded => 0,
        }
    }
}
