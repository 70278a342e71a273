use anyhow::{Context, Result};
use serde::Deserialize;

use crate::http_client::http_client;
use crate::state::Entry;
use crate::viewer::{ViewerProfile, opt_env};

const DEFAULT_API_BASE: &str = "http://localhost:4000";

pub fn fetch_leaderboard() -> Result<Vec<Entry>> {
    let body = fetch_body("/api/friends/leaderboard")?;
    parse_leaderboard_json(&body)
}

pub fn fetch_viewer_profile() -> Result<ViewerProfile> {
    let body = fetch_body("/api/users/me")?;
    parse_profile_json(&body)
}

fn fetch_body(path: &str) -> Result<String> {
    let client = http_client()?;
    let url = format!("{}{path}", api_base());

    let mut req = client.get(&url);
    if let Some(token) = opt_env("LADDER_API_TOKEN") {
        req = req.bearer_auth(token);
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body));
    }
    Ok(body)
}

fn api_base() -> String {
    let base = opt_env("LADDER_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    base.trim_end_matches('/').to_string()
}

// The API serves either a bare array or an object wrapping it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LeaderboardBody {
    List(Vec<Entry>),
    Wrapped { leaderboard: Vec<Entry> },
}

pub fn parse_leaderboard_json(raw: &str) -> Result<Vec<Entry>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let body: LeaderboardBody =
        serde_json::from_str(trimmed).context("invalid leaderboard json")?;
    Ok(match body {
        LeaderboardBody::List(entries) => entries,
        LeaderboardBody::Wrapped { leaderboard } => leaderboard,
    })
}

pub fn parse_profile_json(raw: &str) -> Result<ViewerProfile> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(ViewerProfile::default());
    }
    serde_json::from_str(trimmed).context("invalid profile json")
}
