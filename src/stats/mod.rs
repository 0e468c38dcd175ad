//! View-count store
//!
//! A single JSON document maps each post slug to its view counter:
//!
//! ```json
//! { "posts": { "hello-world": { "views": 3, "lastViewed": "2024-01-15T10:30:00Z" } } }
//! ```
//!
//! Every increment reads, modifies and rewrites the whole document. Reads
//! fail open (a missing or corrupt document is an empty store) and write
//! failures are logged and swallowed. Increments through one store are
//! serialised, so callers sharing an instance never lose updates; separate
//! processes writing the same document are still last-writer-wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::storage::Storage;

/// Storage key of the stats document
pub const STATS_KEY: &str = "stats";

/// View counter for one post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecord {
    pub views: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_viewed: Option<DateTime<Utc>>,
}

/// The persisted document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StatsDocument {
    #[serde(default)]
    posts: BTreeMap<String, ViewRecord>,
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// JSON-document-backed view counts
pub struct StatsStore {
    storage: Arc<dyn Storage>,
    key: String,
    write_lock: Mutex<()>,
    clock: Clock,
}

impl StatsStore {
    /// Create a store persisting under [`STATS_KEY`]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_key(storage, STATS_KEY)
    }

    pub fn with_key(storage: Arc<dyn Storage>, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
            write_lock: Mutex::new(()),
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the time source used for `lastViewed`
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Current view count, 0 when the slug has never been viewed
    pub fn get_views(&self, slug: &str) -> u64 {
        self.read_document()
            .posts
            .get(slug)
            .map(|record| record.views)
            .unwrap_or(0)
    }

    /// Full record for one slug
    pub fn get_record(&self, slug: &str) -> Option<ViewRecord> {
        self.read_document().posts.remove(slug)
    }

    /// Record one view and return the new count.
    ///
    /// The slug does not need to belong to an existing post; a zeroed
    /// record is created on first view.
    pub fn increment_views(&self, slug: &str) -> u64 {
        // A poisoned lock only means another increment panicked; the document on disk is still whole
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut doc = self.read_document();
        let record = doc.posts.entry(slug.to_string()).or_default();
        record.views += 1;
        record.last_viewed = Some((self.clock)());
        let views = record.views;

        self.write_document(&doc);
        views
    }

    /// Snapshot of every record, for joining into post listings
    pub fn get_all_stats(&self) -> BTreeMap<String, ViewRecord> {
        self.read_document().posts
    }

    fn read_document(&self) -> StatsDocument {
        let content = match self.storage.get(&self.key) {
            Ok(Some(content)) => content,
            Ok(None) => return StatsDocument::default(),
            Err(e) => {
                tracing::warn!("Error reading stats document: {}", e);
                return StatsDocument::default();
            }
        };

        match serde_json::from_str::<StatsDocument>(&content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Stats document is corrupt, treating as empty: {}", e);
                StatsDocument::default()
            }
        }
    }

    fn write_document(&self, doc: &StatsDocument) {
        let content = match serde_json::to_string_pretty(doc) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Error serializing stats document: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.put(&self.key, &content) {
            tracing::error!("Error writing stats document: {}", e);
        }
    }
}
