//! Web search contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// One search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search backend for the browsing agent.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run the query and return ranked hits
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}
