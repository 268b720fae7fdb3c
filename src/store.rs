use tracing::debug;

use crate::models::{ObjectId, StoryItem};

// Everything the list view renders from. `is_loading` and `is_error` are
// never both set; only the reducer below writes to this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub items: Vec<StoryItem>,
    pub is_loading: bool,
    pub is_error: bool,
    // Set once the first successful response has landed
    pub loaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Failure,
}

impl SearchState {
    pub fn phase(&self) -> Phase {
        match (self.is_loading, self.is_error) {
            (true, _) => Phase::Loading,
            (false, true) => Phase::Failure,
            (false, false) if self.loaded => Phase::Success,
            (false, false) => Phase::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoriesAction {
    FetchInit,
    FetchSuccess(Vec<StoryItem>),
    FetchFailure,
    RemoveStory(ObjectId),
}

impl StoriesAction {
    fn name(&self) -> &'static str {
        match self {
            StoriesAction::FetchInit => "fetch_init",
            StoriesAction::FetchSuccess(_) => "fetch_success",
            StoriesAction::FetchFailure => "fetch_failure",
            StoriesAction::RemoveStory(_) => "remove_story",
        }
    }
}

pub fn reduce(mut state: SearchState, action: StoriesAction) -> SearchState {
    match action {
        StoriesAction::FetchInit => {
            state.is_loading = true;
            state.is_error = false;
        }
        StoriesAction::FetchSuccess(items) => {
            state.items = items;
            state.is_loading = false;
            state.is_error = false;
            state.loaded = true;
        }
        StoriesAction::FetchFailure => {
            // Previous items stay on screen under the error banner
            state.is_loading = false;
            state.is_error = true;
        }
        StoriesAction::RemoveStory(id) => {
            state.items.retain(|story| story.object_id != id);
        }
    }
    state
}

/// Owns the current [`SearchState`]. All mutation goes through
/// [`StoriesStore::dispatch`].
#[derive(Debug, Default)]
pub struct StoriesStore {
    state: SearchState,
}

impl StoriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn dispatch(&mut self, action: StoriesAction) {
        let name = action.name();
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
        debug!(
            action = name,
            items = self.state.items.len(),
            is_loading = self.state.is_loading,
            is_error = self.state.is_error,
            "stories store updated"
        );
    }

    pub fn begin_fetch(&mut self) {
        self.dispatch(StoriesAction::FetchInit);
    }

    pub fn fetch_succeeded(&mut self, items: Vec<StoryItem>) {
        self.dispatch(StoriesAction::FetchSuccess(items));
    }

    pub fn fetch_failed(&mut self) {
        self.dispatch(StoriesAction::FetchFailure);
    }

    pub fn remove_item(&mut self, id: &ObjectId) {
        self.dispatch(StoriesAction::RemoveStory(id.clone()));
    }
}

// Client-side filter: titles containing the term, ignoring case.
// An empty term keeps every item.
pub fn visible_items<'a>(items: &'a [StoryItem], term: &str) -> Vec<&'a StoryItem> {
    let term = term.to_lowercase();
    items
        .iter()
        .filter(|story| story.title.to_lowercase().contains(&term))
        .collect()
}
