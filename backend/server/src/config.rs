use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr, time::Duration};

use process::{DEFAULT_ORG, models::ENDPOINT};
use snapshot::DEFAULT_PATH;
use tracing::{info, warn};

use crate::error::AppError;

pub const DEFAULT_CRON: &str = "0 0 0 * * *";

pub struct Config {
    pub port: u16,
    pub organization: String,
    pub git_token: Option<String>,
    pub snapshot_path: PathBuf,
    pub cron: String,
    pub throttle: Duration,
    pub request_timeout: Duration,
    pub api_url: String,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Ok(Self {
            port: try_load("PORT", "5000")?,
            organization: try_load("LEADERBOARD_ORG", DEFAULT_ORG)?,
            git_token: load_secret("GIT_TOKEN"),
            snapshot_path: try_load("LEADERBOARD_PATH", DEFAULT_PATH)?,
            cron: try_load("LEADERBOARD_CRON", DEFAULT_CRON)?,
            throttle: Duration::from_millis(try_load("LEADERBOARD_THROTTLE_MS", "3000")?),
            request_timeout: Duration::from_secs(try_load("GITHUB_TIMEOUT_SECS", "30")?),
            api_url: try_load("GITHUB_API_URL", ENDPOINT)?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| AppError::Config(format!("Invalid {key} value {raw:?}: {e}")))
}

/// Environment first, then the mounted secret file.
fn load_secret(secret_name: &str) -> Option<String> {
    if let Some(value) = var(secret_name) {
        return Some(value.trim().to_string());
    }

    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(s) => Some(s.trim().to_string()),
        Err(_) => {
            warn!("{secret_name} not found, requests will be unauthenticated");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_used_when_unset() {
        let port: u16 = try_load("LEADERBOARD_TEST_UNSET_PORT", "5000").unwrap();
        let path: PathBuf = try_load("LEADERBOARD_TEST_UNSET_PATH", DEFAULT_PATH).unwrap();

        assert_eq!(port, 5000);
        assert_eq!(path, PathBuf::from("org_leaderboard.json"));
    }

    #[test]
    fn test_invalid_default_rejected() {
        let result: Result<u16, _> = try_load("LEADERBOARD_TEST_UNSET_BAD", "not-a-port");

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
