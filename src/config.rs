use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::db::{KeyValueStore, MemoryStore, SqliteStore};
use crate::hn_client::API_ENDPOINT;

pub const DEFAULT_TERM: &str = "react";
pub const SEARCH_KEY: &str = "search";

/// Search Hacker News stories.
#[derive(Parser, Debug, Clone)]
#[command(name = "hacker_stories", version, about)]
pub struct Config {
    /// Search term used when none has been saved yet
    #[arg(long, default_value = DEFAULT_TERM)]
    pub term: String,

    /// Search endpoint prefix, the term is appended to it
    #[arg(long, default_value = API_ENDPOINT)]
    pub endpoint: String,

    /// Directory holding the settings database (default: ~/.hacker_stories)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Narrow the displayed list by the search input while typing
    #[arg(long)]
    pub client_filter: bool,

    /// Run one search, print the results and exit
    #[arg(long)]
    pub print: bool,

    /// Keep the search term in memory only
    #[arg(long)]
    pub in_memory: bool,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStore>> {
        if self.in_memory {
            return Ok(Arc::new(MemoryStore::new()));
        }

        let data_dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => SqliteStore::default_data_dir()?,
        };
        Ok(Arc::new(SqliteStore::open(&data_dir)?))
    }

    // The launch search always runs with the configured term; the saved
    // term only fills the input and is searched on submit
    pub fn startup_term(&self) -> &str {
        &self.term
    }
}
