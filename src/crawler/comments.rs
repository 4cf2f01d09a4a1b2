//! Comment acquisition and thread stitching
//!
//! A post's comments come from two listings of the same feed:
//! - the flat listing carries every comment's content, in display order
//! - the threaded listing carries only `above`/`below`/`parent`
//!
//! Both are paginated independently. Each is collected on its own into a
//! plain sequence or map, and `stitch` joins the two by comment id.
//!
//! Pagination stops once the number of collected entries reaches *or
//! exceeds* the total declared by the feed, so a feed that over-delivers
//! cannot keep the loop running. An empty page before the total is reached
//! also ends pagination.

use crate::crawler::source::{CommentFeed, CommentRequest};
use crate::journal::{Comment, FlatComment, ThreadLinks};
use crate::url::FeedMode;
use crate::{ArchiveError, Result};
use chrono::DateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// Format of normalized comment timestamps (UTC)
const COMMENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One decoded page of the comment feed
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommentPage {
    /// Total number of comments the feed claims the post has
    #[serde(default, deserialize_with = "null_as_default")]
    pub replycount: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<RawComment>,
}

/// A comment entry as it appears on the wire
///
/// Flat pages fill the content fields, threaded pages the structure fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawComment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub dtalkid: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub poster: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub userpic: String,
    #[serde(default = "epoch_start")]
    pub ctime_ts: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub article: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub above: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub below: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent: i64,
}

impl RawComment {
    fn into_flat(self) -> FlatComment {
        FlatComment {
            id: self.dtalkid,
            author: self.poster,
            userpic: self.userpic,
            time: normalize_comment_time(&self.ctime_ts),
            content: self.article,
        }
    }

    fn thread_links(&self) -> ThreadLinks {
        ThreadLinks {
            above: self.above,
            below: self.below,
            parent: self.parent,
        }
    }
}

/// A comment without `ctime_ts` is dated at the epoch
fn epoch_start() -> Value {
    Value::from(0)
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Converts a raw `ctime_ts` into a readable UTC timestamp
///
/// Numeric epoch seconds are formatted as `YYYY-MM-DD HH:MM:SS`. Strings are
/// passed through unchanged. An explicit null becomes an empty string; an
/// absent field decodes as 0 and is dated at the epoch.
pub fn normalize_comment_time(raw: &Value) -> String {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|secs| secs as i64))
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.format(COMMENT_TIME_FORMAT).to_string())
            .unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Output of the flat-feed collector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedComments {
    /// Total used to decide when to stop paginating
    pub declared_total: u64,

    /// Comments in arrival order
    pub comments: Vec<FlatComment>,
}

impl CollectedComments {
    /// Number of threading entries needed to cover every collected comment
    ///
    /// The flat feed may deliver more comments than it declared, so the
    /// threaded feed has to be read up to whichever count is larger.
    pub fn thread_total(&self) -> u64 {
        self.declared_total.max(self.comments.len() as u64)
    }
}

/// Paginates the flat feed of a post
///
/// Pages are requested from 1 upwards. `known_total` overrides the feed's
/// own `replycount`; without it, the first page's `replycount` is used for
/// the whole run. A total of zero ends collection after the first request.
pub async fn collect_comments<F>(
    feed: &F,
    post_id: &str,
    known_total: Option<u64>,
    cache_buster: i64,
) -> Result<CollectedComments>
where
    F: CommentFeed + ?Sized,
{
    let mut comments = Vec::new();
    let mut declared_total = known_total;
    let mut page = 1;

    loop {
        let batch = feed
            .fetch_comment_page(CommentRequest {
                post_id,
                mode: FeedMode::Flat,
                page,
                cache_buster,
            })
            .await?;

        let total = *declared_total.get_or_insert(batch.replycount);
        if total == 0 {
            return Ok(CollectedComments::default());
        }

        let received = batch.comments.len();
        comments.extend(batch.comments.into_iter().map(RawComment::into_flat));
        tracing::trace!(
            "Post {}: flat page {} gave {} comments ({}/{})",
            post_id,
            page,
            received,
            comments.len(),
            total
        );

        if comments.len() as u64 >= total {
            break;
        }

        if received == 0 {
            tracing::warn!(
                "Post {}: flat feed ran dry at page {} with {}/{} comments",
                post_id,
                page,
                comments.len(),
                total
            );
            break;
        }

        page += 1;
    }

    Ok(CollectedComments {
        declared_total: declared_total.unwrap_or(0),
        comments,
    })
}

/// Paginates the threaded feed of a post into an id → links map
///
/// Stops once `total` entries have been seen. With a total of zero the feed
/// is not requested at all.
pub async fn collect_threading<F>(
    feed: &F,
    post_id: &str,
    total: u64,
    cache_buster: i64,
) -> Result<HashMap<i64, ThreadLinks>>
where
    F: CommentFeed + ?Sized,
{
    let mut threads = HashMap::new();
    if total == 0 {
        return Ok(threads);
    }

    let mut seen: u64 = 0;
    let mut page = 1;

    loop {
        let batch = feed
            .fetch_comment_page(CommentRequest {
                post_id,
                mode: FeedMode::Threaded,
                page,
                cache_buster,
            })
            .await?;

        let received = batch.comments.len();
        for entry in &batch.comments {
            threads.insert(entry.dtalkid, entry.thread_links());
        }
        seen += received as u64;

        if seen >= total {
            break;
        }

        if received == 0 {
            tracing::warn!(
                "Post {}: threaded feed ran dry at page {} with {}/{} entries",
                post_id,
                page,
                seen,
                total
            );
            break;
        }

        page += 1;
    }

    Ok(threads)
}

/// Joins flat comments with their thread links
///
/// Every comment must have a threading entry; the first one without is
/// reported as `ThreadMismatch`. Output order is the flat feed's order.
pub fn stitch(
    post_id: &str,
    comments: Vec<FlatComment>,
    threads: &HashMap<i64, ThreadLinks>,
) -> Result<Vec<Comment>> {
    comments
        .into_iter()
        .map(|flat| {
            let links = threads
                .get(&flat.id)
                .copied()
                .ok_or_else(|| ArchiveError::ThreadMismatch {
                    post_id: post_id.to_string(),
                    comment_id: flat.id,
                })?;
            Ok(Comment::stitched(flat, links))
        })
        .collect()
}
