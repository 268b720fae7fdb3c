use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::hn_client::{FetchError, SearchApi};
use crate::models::StoryItem;
use crate::store::StoriesStore;

// Identifies one outbound search. Tokens only ever increase, so the latest
// one is the only request allowed to settle the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

struct Completion {
    token: RequestToken,
    term: String,
    outcome: Result<Vec<StoryItem>, FetchError>,
}

/// Runs searches on worker threads and feeds their outcome back into a
/// [`StoriesStore`] on the owner's thread.
///
/// The store is never touched from a worker: results travel over a channel
/// and are applied by [`FetchCoordinator::poll`] or [`FetchCoordinator::wait`].
pub struct FetchCoordinator {
    api: Arc<dyn SearchApi>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    next_token: u64,
    current: Option<RequestToken>,
}

impl FetchCoordinator {
    pub fn new(api: Arc<dyn SearchApi>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            api,
            sender,
            receiver,
            next_token: 0,
            current: None,
        }
    }

    /// Starts a search for `term`. The store is switched to loading before
    /// the request leaves. Returns `None` without touching the store when
    /// the term is empty.
    pub fn search(&mut self, store: &mut StoriesStore, term: &str) -> Option<RequestToken> {
        if term.is_empty() {
            debug!("empty search term, no request issued");
            return None;
        }

        store.begin_fetch();

        self.next_token += 1;
        let token = RequestToken(self.next_token);
        if let Some(previous) = self.current.replace(token) {
            debug!(?previous, ?token, "superseding in-flight search");
        }

        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        let term = term.to_string();
        thread::spawn(move || {
            // A panicking search still has to settle the store
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| api.search(&term)))
                .unwrap_or(Err(FetchError::Panicked));
            // The coordinator may be gone already; nothing to report to then
            let _ = sender.send(Completion { token, term, outcome });
        });

        Some(token)
    }

    pub fn is_in_flight(&self) -> bool {
        self.current.is_some()
    }

    /// Applies every completion that has arrived so far. Returns true if
    /// the current request settled.
    pub fn poll(&mut self, store: &mut StoriesStore) -> bool {
        let mut settled = false;
        while let Ok(completion) = self.receiver.try_recv() {
            settled |= self.settle(store, completion);
        }
        settled
    }

    /// Blocks until the current request settles or `timeout` runs out.
    /// Returns false on timeout.
    pub fn wait(&mut self, store: &mut StoriesStore, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.current.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(completion) => {
                    self.settle(store, completion);
                }
                Err(_) => return false,
            }
        }
        true
    }

    fn settle(&mut self, store: &mut StoriesStore, completion: Completion) -> bool {
        if self.current != Some(completion.token) {
            debug!(token = ?completion.token, term = %completion.term, "dropping response of superseded search");
            return false;
        }
        self.current = None;

        match completion.outcome {
            Ok(stories) => store.fetch_succeeded(stories),
            Err(e) => {
                warn!(term = %completion.term, error = %e, "story search failed");
                store.fetch_failed();
            }
        }
        true
    }
}
