use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::leaderboard;
use crate::viewer::ViewerProfile;

/// One participant's leaderboard record, as served by the friends API.
/// Consumers treat entries as read-only; a refresh replaces the whole
/// sequence rather than mutating rows in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub xp: u64,
    #[serde(rename = "totalTasksCompleted", default)]
    pub total_tasks_completed: u64,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(rename = "isCurrentUser", default)]
    pub is_current_user: bool,
    pub rank: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadedWithFallback,
}

/// Holds the current leaderboard snapshot and drives the
/// idle/loading/loaded/fallback lifecycle.
///
/// Every load is tagged with a generation token. A result is applied only if
/// its token still matches, so a superseded in-flight fetch is discarded on
/// arrival and the newest trigger always wins.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardView {
    phase: LoadPhase,
    entries: Vec<Entry>,
    error: Option<String>,
    generation: u64,
}

impl LeaderboardView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `Loading`, discard any held snapshot, and return the token the
    /// eventual result must carry.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.phase = LoadPhase::Loading;
        self.entries.clear();
        self.error = None;
        self.generation
    }

    /// Apply a successful fetch. An empty sequence is a valid result and is
    /// distinct from failure. Returns false when the token is stale.
    pub fn apply_success(&mut self, generation: u64, entries: Vec<Entry>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.entries = entries;
        self.error = None;
        self.phase = LoadPhase::Loaded;
        true
    }

    /// Apply a failed fetch. The view never surfaces a fatal error: it keeps
    /// the advisory message and shows the synthesized viewer entry instead,
    /// so partition/aggregate always have a sequence to work on.
    pub fn apply_failure(&mut self, generation: u64, fallback: Entry, message: String) -> bool {
        if generation != self.generation {
            return false;
        }
        self.entries = vec![fallback];
        self.error = Some(message);
        self.phase = LoadPhase::LoadedWithFallback;
        true
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: LeaderboardView,
    pub viewer: ViewerProfile,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub updated_at: Option<chrono::DateTime<chrono::Local>>,
    pub refresh_requested: Option<u64>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            view: LeaderboardView::new(),
            viewer: ViewerProfile::default(),
            selected: 0,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
            updated_at: None,
            refresh_requested: None,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Adopt a (possibly refreshed) viewer profile. When the identity key
    /// changes, the held leaderboard belongs to someone else: drop it and
    /// start a new load, returning the generation the caller must fetch for.
    pub fn ensure_viewer(&mut self, profile: ViewerProfile) -> Option<u64> {
        let changed = self.viewer.id != profile.id;
        self.viewer = profile;
        if changed {
            self.selected = 0;
            Some(self.view.begin_load())
        } else {
            None
        }
    }

    pub fn take_refresh_request(&mut self) -> Option<u64> {
        self.refresh_requested.take()
    }

    pub fn podium(&self) -> &[Entry] {
        leaderboard::partition(self.view.entries()).0
    }

    pub fn remainder(&self) -> &[Entry] {
        leaderboard::partition(self.view.entries()).1
    }

    pub fn stats(&self) -> leaderboard::SummaryStats {
        leaderboard::aggregate(self.view.entries())
    }

    pub fn current_user(&self) -> Option<&Entry> {
        leaderboard::find_current_user(self.view.entries())
    }

    pub fn select_next(&mut self) {
        let total = self.remainder().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.remainder().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.remainder().len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetLeaderboard { generation: u64, entries: Vec<Entry> },
    LeaderboardFailed { generation: u64, message: String },
    SetViewerProfile(ViewerProfile),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchLeaderboard { generation: u64 },
    FetchProfile,
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetLeaderboard { generation, entries } => {
            let count = entries.len();
            if !state.view.apply_success(generation, entries) {
                state.push_log("[INFO] Discarded stale leaderboard result");
                return;
            }
            if leaderboard::flagged_viewer_count(state.view.entries()) > 1 {
                state.push_log("[WARN] Source flagged multiple entries as the viewer");
            }
            if !leaderboard::ranks_are_well_formed(state.view.entries()) {
                state.push_log("[WARN] Source ranks are not contiguous");
            }
            state.updated_at = Some(chrono::Local::now());
            state.clamp_selection();
            state.push_log(format!("[INFO] Leaderboard loaded ({count} entries)"));
        }
        Delta::LeaderboardFailed { generation, message } => {
            let fallback = leaderboard::fallback_entry(&state.viewer);
            if !state.view.apply_failure(generation, fallback, message.clone()) {
                state.push_log("[INFO] Discarded stale leaderboard failure");
                return;
            }
            state.updated_at = Some(chrono::Local::now());
            state.clamp_selection();
            state.push_log(format!("[WARN] {message}"));
        }
        Delta::SetViewerProfile(profile) => {
            if let Some(generation) = state.ensure_viewer(profile) {
                state.refresh_requested = Some(generation);
                state.push_log("[INFO] Viewer changed, reloading leaderboard");
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
