//! Record types flowing through the pipeline.

use serde::Deserialize;

/// One decoded post event as it arrives on the wire.
///
/// All identifiers are strings on the wire; they are parsed into integers by
/// the transform stage. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawEvent {
    /// Identifier of the post.
    pub id: String,
    /// Body text, possibly containing embedded newlines.
    pub text: String,
    /// Identifier of the posting account.
    pub author_id: String,
}

/// A fully enriched record, ready for persistence.
///
/// `author_name` is always non-empty: events whose author is missing from the
/// directory snapshot never become records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetRecord {
    pub tweet_id: i64,
    pub author_id: i64,
    pub author_name: String,
    /// Body text with embedded newlines stripped.
    pub text: String,
}

/// A single author-id to display-name association, as stored in Postgres.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMapping {
    pub author_id: i64,
    pub author_name: String,
}
