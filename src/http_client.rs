use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::viewer::opt_env;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        let timeout = opt_env("LADDER_HTTP_TIMEOUT_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 60);
        Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .context("failed to build http client")
    })
}
