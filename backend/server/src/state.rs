use std::sync::Arc;

use process::{github::GitHub, throttle::Throttle};
use snapshot::SnapshotStore;

use super::{config::Config, error::AppError, scheduler::RunGuard};

pub struct AppState {
    pub config: Config,
    pub store: SnapshotStore,
    pub github: GitHub,
    pub throttle: Throttle,
    pub guard: RunGuard,
}

impl AppState {
    pub fn new() -> Result<Arc<Self>, AppError> {
        let config = Config::load()?;

        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Arc<Self>, AppError> {
        let github = GitHub::new(
            &config.api_url,
            config.git_token.clone(),
            config.request_timeout,
        )?;

        Ok(Arc::new(Self {
            store: SnapshotStore::new(&config.snapshot_path),
            throttle: Throttle::per_window(1, config.throttle),
            github,
            config,
            guard: RunGuard::default(),
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{path::Path, time::Duration};

    use super::*;

    pub(crate) fn test_state(snapshot_path: &Path) -> Arc<AppState> {
        let config = Config {
            port: 0,
            organization: "org".to_string(),
            git_token: None,
            snapshot_path: snapshot_path.to_path_buf(),
            cron: crate::config::DEFAULT_CRON.to_string(),
            throttle: Duration::ZERO,
            request_timeout: Duration::from_secs(1),
            api_url: "http://127.0.0.1:9".to_string(),
        };

        AppState::with_config(config).unwrap()
    }
}
