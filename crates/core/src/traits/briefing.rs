//! News briefing contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// One briefing story
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub summary: String,
    pub source: String,
}

/// Fetches the day's top stories for a category.
#[async_trait]
pub trait BriefingSource: Send + Sync {
    /// Ordered top stories for the category
    async fn top_stories(&self, category: &str) -> Result<Vec<Story>>;
}
