use xp_ladder::state::{AppState, Delta, Entry, LoadPhase, apply_delta};
use xp_ladder::viewer::ViewerProfile;

fn entry(id: &str, name: &str, xp: u64, rank: u32) -> Entry {
    Entry {
        id: id.to_string(),
        name: name.to_string(),
        email: String::new(),
        level: 2,
        xp,
        total_tasks_completed: 4,
        avatar: None,
        is_current_user: false,
        rank,
    }
}

fn ada() -> ViewerProfile {
    ViewerProfile {
        id: "ada-1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        level: 1,
        xp: 0,
        total_tasks_completed: 0,
    }
}

#[test]
fn successful_load_reaches_loaded_with_the_snapshot() {
    let mut state = AppState::new();
    assert_eq!(state.view.phase(), LoadPhase::Idle);

    let generation = state.view.begin_load();
    assert!(state.view.is_loading());
    assert!(state.view.entries().is_empty());

    apply_delta(
        &mut state,
        Delta::SetLeaderboard {
            generation,
            entries: vec![entry("a", "A", 500, 1), entry("b", "B", 300, 2)],
        },
    );

    assert_eq!(state.view.phase(), LoadPhase::Loaded);
    assert_eq!(state.view.entries().len(), 2);
    assert!(state.view.error_message().is_none());
    assert!(state.updated_at.is_some());
}

#[test]
fn empty_success_is_loaded_not_fallback() {
    let mut state = AppState::new();
    let generation = state.view.begin_load();

    apply_delta(
        &mut state,
        Delta::SetLeaderboard {
            generation,
            entries: Vec::new(),
        },
    );

    assert_eq!(state.view.phase(), LoadPhase::Loaded);
    assert!(state.view.entries().is_empty());
    assert!(state.view.error_message().is_none());
    assert!(state.podium().is_empty());
    assert!(state.remainder().is_empty());
    assert_eq!(state.stats().participant_count, 0);
    assert!(state.current_user().is_none());
}

#[test]
fn failed_load_falls_back_to_the_viewer_alone() {
    let mut state = AppState::new();
    state.viewer = ada();
    let generation = state.view.begin_load();

    apply_delta(
        &mut state,
        Delta::LeaderboardFailed {
            generation,
            message: "Failed to load leaderboard. Please try again.".to_string(),
        },
    );

    assert_eq!(state.view.phase(), LoadPhase::LoadedWithFallback);
    assert_eq!(state.view.entries().len(), 1);
    assert_eq!(
        state.view.error_message(),
        Some("Failed to load leaderboard. Please try again.")
    );

    let you = &state.view.entries()[0];
    assert_eq!(you.name, "Ada");
    assert_eq!(you.rank, 1);
    assert!(you.is_current_user);

    assert_eq!(state.podium().len(), 1);
    assert!(state.remainder().is_empty());
    assert_eq!(state.current_user().map(|e| e.name.as_str()), Some("Ada"));
}

#[test]
fn reload_discards_the_previous_snapshot() {
    let mut state = AppState::new();
    let generation = state.view.begin_load();
    apply_delta(
        &mut state,
        Delta::SetLeaderboard {
            generation,
            entries: vec![entry("a", "A", 500, 1)],
        },
    );

    state.view.begin_load();
    assert!(state.view.is_loading());
    assert!(state.view.entries().is_empty());
    assert!(state.view.error_message().is_none());
}

#[test]
fn stale_results_are_discarded_and_newest_wins() {
    let mut state = AppState::new();
    let first = state.view.begin_load();
    let second = state.view.begin_load();

    // The superseded fetch resolves after the newer one was issued.
    apply_delta(
        &mut state,
        Delta::SetLeaderboard {
            generation: first,
            entries: vec![entry("old", "Old", 1, 1)],
        },
    );
    assert!(state.view.is_loading());
    assert!(state.view.entries().is_empty());

    apply_delta(
        &mut state,
        Delta::SetLeaderboard {
            generation: second,
            entries: vec![entry("new", "New", 900, 1)],
        },
    );
    assert_eq!(state.view.phase(), LoadPhase::Loaded);
    assert_eq!(state.view.entries()[0].id, "new");

    // A stale failure is ignored just the same.
    let third = state.view.begin_load();
    apply_delta(
        &mut state,
        Delta::LeaderboardFailed {
            generation: third - 1,
            message: "late failure".to_string(),
        },
    );
    assert!(state.view.is_loading());
    assert!(state.view.error_message().is_none());
}

#[test]
fn viewer_identity_change_retriggers_a_load() {
    let mut state = AppState::new();
    state.viewer = ada();
    let generation = state.view.begin_load();
    apply_delta(
        &mut state,
        Delta::SetLeaderboard {
            generation,
            entries: vec![entry("a", "A", 500, 1)],
        },
    );

    let mut other = ada();
    other.id = "grace-1".to_string();
    other.name = "Grace".to_string();
    apply_delta(&mut state, Delta::SetViewerProfile(other));

    assert!(state.view.is_loading());
    assert!(state.view.entries().is_empty());
    let requested = state.take_refresh_request();
    assert_eq!(requested, Some(state.view.generation()));
    assert_eq!(state.take_refresh_request(), None);
    assert_eq!(state.viewer.name, "Grace");
}

#[test]
fn same_viewer_profile_refresh_does_not_retrigger() {
    let mut state = AppState::new();
    state.viewer = ada();
    let generation = state.view.begin_load();
    apply_delta(
        &mut state,
        Delta::SetLeaderboard {
            generation,
            entries: vec![entry("a", "A", 500, 1)],
        },
    );

    let mut same = ada();
    same.xp = 750;
    apply_delta(&mut state, Delta::SetViewerProfile(same));

    assert_eq!(state.view.phase(), LoadPhase::Loaded);
    assert_eq!(state.take_refresh_request(), None);
    assert_eq!(state.viewer.xp, 750);
}

#[test]
fn duplicate_viewer_flags_are_logged_not_fatal() {
    let mut state = AppState::new();
    let generation = state.view.begin_load();

    let mut a = entry("a", "A", 500, 1);
    a.is_current_user = true;
    let mut b = entry("b", "B", 300, 2);
    b.is_current_user = true;

    apply_delta(
        &mut state,
        Delta::SetLeaderboard {
            generation,
            entries: vec![a, b],
        },
    );

    assert_eq!(state.view.phase(), LoadPhase::Loaded);
    assert_eq!(state.current_user().map(|e| e.id.as_str()), Some("a"));
    assert!(
        state
            .logs
            .iter()
            .any(|line| line.contains("[WARN]") && line.contains("multiple entries"))
    );
}

#[test]
fn selection_is_clamped_to_the_remainder() {
    let mut state = AppState::new();
    let generation = state.view.begin_load();
    let entries: Vec<Entry> = (0..6)
        .map(|i| entry(&format!("u{i}"), "U", 600 - i as u64, i as u32 + 1))
        .collect();
    state.selected = 10;

    apply_delta(&mut state, Delta::SetLeaderboard { generation, entries });

    // 6 entries leave a remainder of 3.
    assert_eq!(state.selected, 2);

    state.select_next();
    assert_eq!(state.selected, 0);
    state.select_prev();
    assert_eq!(state.selected, 2);
}
