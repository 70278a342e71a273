use crate::state::Entry;
use crate::viewer::ViewerProfile;

pub const PODIUM_SIZE: usize = 3;

/// Split an already-ranked sequence into podium (first three) and remainder.
/// Order is preserved on both sides and the two slices concatenate back to
/// the input exactly; no allocation, no re-sorting.
pub fn partition(entries: &[Entry]) -> (&[Entry], &[Entry]) {
    entries.split_at(entries.len().min(PODIUM_SIZE))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SummaryStats {
    pub participant_count: usize,
    pub combined_xp: u64,
    pub combined_tasks: u64,
}

/// Totals over the full sequence, not just the visible podium. u64 sums keep
/// tens of thousands of entries at 10^9 xp each well clear of overflow.
pub fn aggregate(entries: &[Entry]) -> SummaryStats {
    entries.iter().fold(SummaryStats::default(), |acc, e| SummaryStats {
        participant_count: acc.participant_count + 1,
        combined_xp: acc.combined_xp + e.xp,
        combined_tasks: acc.combined_tasks + e.total_tasks_completed,
    })
}

/// First entry flagged as the viewer. Absence is a normal state (the viewer
/// may have no ranking yet); a duplicate flag upstream is tolerated by
/// taking the first match, and the caller may report it via
/// [`flagged_viewer_count`].
pub fn find_current_user(entries: &[Entry]) -> Option<&Entry> {
    entries.iter().find(|e| e.is_current_user)
}

pub fn flagged_viewer_count(entries: &[Entry]) -> usize {
    entries.iter().filter(|e| e.is_current_user).count()
}

/// A correctly-ranked sequence carries ranks 1..=N in order.
pub fn ranks_are_well_formed(entries: &[Entry]) -> bool {
    entries
        .iter()
        .enumerate()
        .all(|(idx, e)| e.rank as usize == idx + 1)
}

/// Synthesize the single-entry board shown when the fetch fails: the viewer
/// alone at rank 1, built from the last-known profile. Profile fields that
/// were never populated stay at their zero/empty defaults, so every field is
/// defined under every precondition.
pub fn fallback_entry(viewer: &ViewerProfile) -> Entry {
    Entry {
        id: viewer.id.clone(),
        name: viewer.name.clone(),
        email: viewer.email.clone(),
        level: viewer.level,
        xp: viewer.xp,
        total_tasks_completed: viewer.total_tasks_completed,
        avatar: None,
        is_current_user: true,
        rank: 1,
    }
}
