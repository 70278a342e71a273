use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use rand::Rng;

use crate::leaderboard_fetch;
use crate::state::{Delta, Entry, ProviderCommand};
use crate::viewer::{ViewerProfile, opt_env, viewer_profile_from_env};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to load leaderboard. Please try again.";

/// Background provider owning all transport. Commands arrive over `cmd_rx`,
/// results leave as deltas over `tx`; the UI thread never blocks on the
/// network. The generation token from each `FetchLeaderboard` is echoed back
/// unchanged so the state layer can discard superseded results.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let source = opt_env("LADDER_SOURCE")
            .unwrap_or_else(|| "api".to_string())
            .to_lowercase();
        let mut demo = if source == "demo" {
            Some(DemoLadder::seed(viewer_profile_from_env()))
        } else {
            None
        };

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::FetchLeaderboard { generation } => {
                    if let Some(demo) = demo.as_mut() {
                        match demo.next_board() {
                            Ok(entries) => {
                                let _ = tx.send(Delta::SetLeaderboard { generation, entries });
                            }
                            Err(message) => {
                                let _ = tx.send(Delta::Log(format!(
                                    "[WARN] Demo leaderboard error: {message}"
                                )));
                                let _ = tx.send(Delta::LeaderboardFailed {
                                    generation,
                                    message: FETCH_FAILED_MESSAGE.to_string(),
                                });
                            }
                        }
                        continue;
                    }

                    match leaderboard_fetch::fetch_leaderboard() {
                        Ok(entries) => {
                            let _ = tx.send(Delta::SetLeaderboard { generation, entries });
                        }
                        Err(err) => {
                            let _ =
                                tx.send(Delta::Log(format!("[WARN] Leaderboard fetch: {err}")));
                            let _ = tx.send(Delta::LeaderboardFailed {
                                generation,
                                message: FETCH_FAILED_MESSAGE.to_string(),
                            });
                        }
                    }
                }
                ProviderCommand::FetchProfile => {
                    if let Some(demo) = demo.as_ref() {
                        let _ = tx.send(Delta::SetViewerProfile(demo.viewer.clone()));
                        continue;
                    }
                    match leaderboard_fetch::fetch_viewer_profile() {
                        Ok(profile) => {
                            let _ = tx.send(Delta::SetViewerProfile(profile));
                        }
                        Err(err) => {
                            // Env-seeded profile stays in effect.
                            let _ = tx.send(Delta::Log(format!("[WARN] Profile fetch: {err}")));
                        }
                    }
                }
            }
        }
    });
}

/// Offline source for demos and development. It plays the role of the
/// upstream ranking authority, so it is the one place that sorts by XP and
/// assigns ranks; consumers keep trusting the order they are given.
pub struct DemoLadder {
    viewer: ViewerProfile,
    members: Vec<Entry>,
    flake_pct: u32,
}

impl DemoLadder {
    pub fn seed(mut viewer: ViewerProfile) -> Self {
        if viewer.id.is_empty() {
            viewer.id = "demo-you".to_string();
        }
        if viewer.name.is_empty() {
            viewer.name = "You".to_string();
        }

        let mut members = vec![
            demo_member("demo-f1", "Maya", 12, 4_820, 97),
            demo_member("demo-f2", "Jonas", 11, 4_310, 84),
            demo_member("demo-f3", "Priya", 10, 3_950, 71),
            demo_member("demo-f4", "Theo", 9, 3_120, 66),
            demo_member("demo-f5", "Lena", 8, 2_480, 52),
            demo_member("demo-f6", "Sam", 7, 1_940, 43),
            demo_member("demo-f7", "Noor", 5, 1_210, 28),
        ];
        members.push(Entry {
            id: viewer.id.clone(),
            name: viewer.name.clone(),
            email: viewer.email.clone(),
            level: viewer.level.max(1),
            xp: viewer.xp.max(1_500),
            total_tasks_completed: viewer.total_tasks_completed.max(30),
            avatar: None,
            is_current_user: true,
            rank: 0,
        });

        let flake_pct = opt_env("LADDER_DEMO_FLAKE_PCT")
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(0)
            .min(100);

        Self {
            viewer,
            members,
            flake_pct,
        }
    }

    pub fn next_board(&mut self) -> Result<Vec<Entry>, String> {
        let mut rng = rand::thread_rng();
        if self.flake_pct > 0 && rng.gen_range(0..100) < self.flake_pct {
            return Err("simulated outage".to_string());
        }

        // Everyone earns a little between refreshes.
        for member in &mut self.members {
            if rng.gen_bool(0.6) {
                member.xp += rng.gen_range(5..120);
            }
            if rng.gen_bool(0.2) {
                member.total_tasks_completed += 1;
            }
        }

        Ok(rank_board(self.members.clone()))
    }
}

fn rank_board(mut members: Vec<Entry>) -> Vec<Entry> {
    // Stable sort keeps insertion order for XP ties.
    members.sort_by(|a, b| b.xp.cmp(&a.xp));
    for (idx, member) in members.iter_mut().enumerate() {
        member.rank = idx as u32 + 1;
    }
    members
}

fn demo_member(id: &str, name: &str, level: u32, xp: u64, tasks: u64) -> Entry {
    Entry {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        level,
        xp,
        total_tasks_completed: tasks,
        avatar: None,
        is_current_user: false,
        rank: 0,
    }
}
