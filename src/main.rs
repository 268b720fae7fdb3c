use anyhow::{anyhow, bail, Result};
use clap::Parser;
use eframe::egui::ViewportBuilder;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

mod app;
mod config;
mod coordinator;
mod db;
mod hn_client;
mod models;
mod store;

use crate::app::StoriesApp;
use crate::config::{Config, SEARCH_KEY};
use crate::coordinator::FetchCoordinator;
use crate::db::{KeyValueStore, MemoryStore, PersistedValue};
use crate::hn_client::{HackerNewsClient, SearchApi};
use crate::store::{visible_items, Phase, StoriesStore};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hacker_stories=info".parse()?),
        )
        .with_target(false)
        .init();

    let config = Config::parse();

    let client = HackerNewsClient::new(config.endpoint.clone(), config.timeout())?;
    info!(endpoint = client.endpoint(), "using search endpoint");
    let api: Arc<dyn SearchApi> = Arc::new(client);

    // Without a database the term still works, it just won't survive a restart
    let storage: Arc<dyn KeyValueStore> = match config.open_storage() {
        Ok(storage) => storage,
        Err(e) => {
            error!(error = %e, "failed to open settings database, search term will not be saved");
            Arc::new(MemoryStore::new())
        }
    };
    let search_term = PersistedValue::load(storage, SEARCH_KEY, "")?;
    let startup_term = config.startup_term().to_string();

    if config.print {
        return print_stories(&config, api, &startup_term);
    }

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("My Hacker Stories"),
        ..Default::default()
    };

    let client_filter = config.client_filter;
    eframe::run_native(
        "My Hacker Stories",
        options,
        Box::new(move |cc| {
            let coordinator = FetchCoordinator::new(api);
            let mut app = StoriesApp::new(coordinator, search_term, &startup_term, client_filter);
            if let Some(storage) = cc.storage {
                app.restore(storage);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("Failed to run application: {}", e))
}

// Headless mode: one search, results on stdout
fn print_stories(config: &Config, api: Arc<dyn SearchApi>, term: &str) -> Result<()> {
    let mut store = StoriesStore::new();
    let mut coordinator = FetchCoordinator::new(api);

    if coordinator.search(&mut store, term).is_none() {
        warn!("search term is empty, nothing to print");
        return Ok(());
    }

    // The HTTP client times out on its own; the margin covers thread hand-off
    if !coordinator.wait(&mut store, config.timeout() + Duration::from_secs(5)) {
        bail!("search for '{}' did not finish in time", term);
    }

    let state = store.state();
    if state.phase() == Phase::Failure {
        bail!("Something went wrong while searching for '{}'", term);
    }

    let stories = if config.client_filter {
        visible_items(&state.items, term)
    } else {
        state.items.iter().collect()
    };

    for (rank, story) in stories.iter().enumerate() {
        let comments = story.num_comments.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:>3}. {} ({} pts, {} comments, by {})",
            rank + 1,
            story.title,
            story.points,
            comments,
            story.author
        );
        if !story.url.is_empty() {
            println!("     {}", story.url);
        }
    }

    Ok(())
}
