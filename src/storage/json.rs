//! JSON directory storage
//!
//! Layout:
//!
//! ```text
//! <root>/<journal>/<post id>.json   one pretty-printed file per post
//! <root>/<journal>/complete.json    the whole archive, written at the end
//! ```

use crate::journal::{JournalArchive, Post};
use crate::storage::traits::{PostSink, StorageResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the complete archive
pub const ARCHIVE_FILE_NAME: &str = "complete.json";

/// Writes posts as individual JSON files below a journal directory
pub struct JsonDirectoryStorage {
    directory: PathBuf,
}

impl JsonDirectoryStorage {
    /// Creates (if needed) `<root>/<journal>` and writes below it
    pub fn new(root: &Path, journal: &str) -> StorageResult<Self> {
        let directory = root.join(journal);
        fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file a post is written to
    pub fn post_path(&self, post: &Post) -> PathBuf {
        self.directory.join(format!("{}.json", file_stem(&post.id)))
    }

    fn write_pretty<T: Serialize>(&self, path: &Path, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json)?;
        tracing::debug!("Saved {}", path.display());
        Ok(())
    }
}

impl PostSink for JsonDirectoryStorage {
    fn store_post(&mut self, post: &Post) -> StorageResult<()> {
        let path = self.post_path(post);
        self.write_pretty(&path, post)
    }

    fn store_archive(&mut self, archive: &JournalArchive) -> StorageResult<()> {
        let path = self.directory.join(ARCHIVE_FILE_NAME);
        self.write_pretty(&path, archive)
    }
}

/// Post ids can contain path separators for nested journal layouts
fn file_stem(post_id: &str) -> String {
    let stem: String = post_id
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    if stem.is_empty() {
        "post".to_string()
    } else {
        stem
    }
}
