use std::env;

use serde::{Deserialize, Serialize};

/// Last-known profile of the person looking at the leaderboard. Used to
/// synthesize the fallback entry when the fetch fails, and as the identity
/// key whose change re-triggers a load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewerProfile {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub xp: u64,
    #[serde(rename = "totalTasksCompleted", default)]
    pub total_tasks_completed: u64,
}

/// Seed profile from the environment, before (or instead of) a profile
/// fetch. Unset or blank variables fall back to zero/empty.
pub fn viewer_profile_from_env() -> ViewerProfile {
    ViewerProfile {
        id: opt_env("VIEWER_ID").unwrap_or_default(),
        name: opt_env("VIEWER_NAME").unwrap_or_default(),
        email: opt_env("VIEWER_EMAIL").unwrap_or_default(),
        level: parse_env_or_default("VIEWER_LEVEL", 0),
        xp: parse_env_or_default("VIEWER_XP", 0),
        total_tasks_completed: parse_env_or_default("VIEWER_TASKS", 0),
    }
}

pub fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        let trimmed = val.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_env_or_default<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    opt_env(key)
        .and_then(|val| val.parse::<T>().ok())
        .unwrap_or(default)
}
