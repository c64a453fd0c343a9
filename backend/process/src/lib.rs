//! # Leaderboard Processing
//!
//! Ranks every contributor of an organization by merged pull requests.
//!
//! ## Run
//! 1. List every repository of the organization. If this fails the run is over and
//!    the snapshot on disk stays as it was.
//!
//! 2. For each repository, in listed order, search its merged pull requests.
//!
//! 3. Credit each pull request to its author, 10 points per distinct URL. A URL already
//!    credited is ignored, so pages that overlap never double count.
//!
//! 4. A repository that fails to fetch is logged and skipped, the run keeps going.
//!
//! 5. Wait out the throttle after every repository, failed or not.
//!
//! 6. Sort by score (stable, first seen wins ties), number the ranks, write the snapshot.
//!
//! ## Notes
//! - Repositories are walked one at a time on purpose, the throttle is what keeps us under
//!   the search rate limit
//! - The ranking table lives only as long as one run, nothing is merged with the previous snapshot
use chrono::Local;
use snapshot::{LeaderboardSnapshot, SnapshotStore};
use tracing::{debug, info, warn};

pub mod error;
pub mod github;
pub mod models;
pub mod source;
pub mod tally;
pub mod throttle;
pub mod utils;

use error::{FetchError, GenerateError};
use models::Repository;
use source::Source;
use tally::Tally;
use throttle::Throttle;
use utils::timestring;

pub const DEFAULT_ORG: &str = "recodehive";

#[derive(Debug)]
pub struct Aggregation {
    pub tally: Tally,
    pub repositories: usize,
    pub failed: Vec<String>,
}

pub async fn aggregate<S, F>(
    source: &S,
    organization: &str,
    throttle: &Throttle,
    mut on_repository: F,
) -> Result<Aggregation, FetchError>
where
    S: Source + Sync,
    F: FnMut(&Repository) + Send,
{
    let repositories = source.list_repositories(organization).await?;
    info!("Found {} repositories in {organization}", repositories.len());

    let mut tally = Tally::new();
    let mut failed = Vec::new();

    for repository in &repositories {
        on_repository(repository);
        debug!("Fetching PRs for {}", repository.full_name);

        match source.merged_pull_requests(&repository.full_name).await {
            Ok(pull_requests) => {
                let credited = pull_requests.iter().filter(|pr| tally.record(pr)).count();
                debug!(
                    "{}: {} merged PRs, {credited} credited",
                    repository.full_name,
                    pull_requests.len()
                );
            }
            Err(e) => {
                warn!("Error fetching PRs for {}: {e}", repository.full_name);
                failed.push(repository.full_name.clone());
            }
        }

        throttle.wait().await;
    }

    info!(
        "Aggregated {} contributors across {} repositories",
        tally.len(),
        repositories.len()
    );

    Ok(Aggregation {
        tally,
        repositories: repositories.len(),
        failed,
    })
}

pub async fn generate<S>(
    source: &S,
    organization: &str,
    throttle: &Throttle,
    store: &SnapshotStore,
) -> Result<LeaderboardSnapshot, GenerateError>
where
    S: Source + Sync,
{
    generate_with(source, organization, throttle, store, |_| {}).await
}

/// [`generate`] with a hook called before each repository is fetched.
pub async fn generate_with<S, F>(
    source: &S,
    organization: &str,
    throttle: &Throttle,
    store: &SnapshotStore,
    on_repository: F,
) -> Result<LeaderboardSnapshot, GenerateError>
where
    S: Source + Sync,
    F: FnMut(&Repository) + Send,
{
    let aggregation = aggregate(source, organization, throttle, on_repository)
        .await
        .map_err(GenerateError::Listing)?;

    if !aggregation.failed.is_empty() {
        warn!(
            "{} of {} repositories failed: {}",
            aggregation.failed.len(),
            aggregation.repositories,
            aggregation.failed.join(", ")
        );
    }

    let now = Local::now();
    let snapshot = LeaderboardSnapshot::generated(
        aggregation.tally.into_ranked(),
        now.timestamp_millis(),
        timestring(&now),
    );

    store.write(&snapshot)?;
    info!(
        "{organization} leaderboard generated with {} contributors",
        snapshot.leaderboard.len()
    );

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{HashMap, HashSet},
        time::Duration,
    };

    use reqwest::StatusCode;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        models::PullRequest,
        tally::tests::{pr, user},
    };

    #[derive(Default)]
    struct FakeSource {
        repositories: Vec<Repository>,
        pulls: HashMap<String, Vec<PullRequest>>,
        failing: HashSet<String>,
        listing_fails: bool,
    }

    impl FakeSource {
        fn repo(mut self, name: &str, pulls: Vec<PullRequest>) -> Self {
            let full_name = format!("org/{name}");
            self.repositories.push(Repository {
                name: name.to_string(),
                full_name: full_name.clone(),
            });
            self.pulls.insert(full_name, pulls);
            self
        }

        fn failing(mut self, name: &str) -> Self {
            self.failing.insert(format!("org/{name}"));
            self
        }
    }

    impl Source for FakeSource {
        async fn list_repositories(&self, _: &str) -> Result<Vec<Repository>, FetchError> {
            if self.listing_fails {
                return Err(FetchError::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    url: "/orgs/org/repos".to_string(),
                });
            }

            Ok(self.repositories.clone())
        }

        async fn merged_pull_requests(
            &self,
            full_name: &str,
        ) -> Result<Vec<PullRequest>, FetchError> {
            if self.failing.contains(full_name) {
                return Err(FetchError::RateLimited { reset: None });
            }

            Ok(self.pulls.get(full_name).cloned().unwrap_or_default())
        }
    }

    fn store(dir: &TempDir) -> SnapshotStore {
        SnapshotStore::new(dir.path().join("org_leaderboard.json"))
    }

    #[tokio::test]
    async fn test_repeated_pr_scored_once() {
        let alice = user(1, "alice");
        let source = FakeSource::default().repo("x", vec![pr(&alice, "x", 1), pr(&alice, "x", 1)]);

        let aggregation = aggregate(&source, "org", &Throttle::none(), |_| {}).await.unwrap();

        assert_eq!(aggregation.tally.get(1).unwrap().score, 10);
    }

    #[tokio::test]
    async fn test_failed_repository_isolated() {
        let alice = user(1, "alice");
        let bob = user(2, "bob");
        let carol = user(3, "carol");
        let source = FakeSource::default()
            .repo("a", vec![pr(&alice, "a", 1)])
            .repo("b", vec![pr(&bob, "b", 1)])
            .repo("c", vec![pr(&carol, "c", 1), pr(&alice, "c", 2)])
            .failing("b");

        let dir = TempDir::new().unwrap();
        let snapshot = generate(&source, "org", &Throttle::none(), &store(&dir))
            .await
            .unwrap();

        let logins: Vec<&str> = snapshot.leaderboard.iter().map(|e| e.login.as_str()).collect();
        assert_eq!(logins, ["alice", "carol"]);
        assert!(snapshot.success);
        assert!(snapshot.generated);
        assert_eq!(snapshot.leaderboard[0].score, 20);
    }

    #[tokio::test]
    async fn test_failed_repositories_reported() {
        let source = FakeSource::default()
            .repo("a", vec![])
            .repo("b", vec![])
            .failing("a")
            .failing("b");

        let aggregation = aggregate(&source, "org", &Throttle::none(), |_| {}).await.unwrap();

        assert_eq!(aggregation.repositories, 2);
        assert_eq!(aggregation.failed, ["org/a", "org/b"]);
        assert!(aggregation.tally.is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_keeps_previous_snapshot() {
        let alice = user(1, "alice");
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let first = FakeSource::default().repo("x", vec![pr(&alice, "x", 1)]);
        let previous = generate(&first, "org", &Throttle::none(), &store).await.unwrap();

        let broken = FakeSource {
            listing_fails: true,
            ..FakeSource::default()
        };
        let result = generate(&broken, "org", &Throttle::none(), &store).await;

        assert!(matches!(result, Err(GenerateError::Listing(_))));
        assert_eq!(store.read(), previous);
    }

    #[tokio::test]
    async fn test_fresh_run_replaces_snapshot() {
        let alice = user(1, "alice");
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let first = FakeSource::default().repo("x", vec![pr(&alice, "x", 1)]);
        let snapshot = generate(&first, "org", &Throttle::none(), &store).await.unwrap();
        assert_eq!(snapshot.leaderboard[0].score, 10);

        let second = FakeSource::default()
            .repo("x", vec![pr(&alice, "x", 1)])
            .repo("y", vec![pr(&alice, "y", 1)]);
        generate(&second, "org", &Throttle::none(), &store).await.unwrap();

        let snapshot = store.read();
        let entry = &snapshot.leaderboard[0];
        assert_eq!(snapshot.leaderboard.len(), 1);
        assert_eq!(entry.score, 20);
        assert_eq!(entry.no_of_prs, 2);
        assert_eq!(
            entry.pr_urls,
            [
                "https://github.com/org/x/pull/1",
                "https://github.com/org/y/pull/1"
            ]
        );
    }

    #[tokio::test]
    async fn test_repositories_visited_in_order() {
        let source = FakeSource::default()
            .repo("one", vec![])
            .repo("two", vec![])
            .repo("three", vec![]);

        let mut visited = Vec::new();
        aggregate(&source, "org", &Throttle::none(), |repository| {
            visited.push(repository.name.clone())
        })
        .await
        .unwrap();

        assert_eq!(visited, ["one", "two", "three"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_applies_to_failures() {
        let source = FakeSource::default()
            .repo("a", vec![])
            .repo("b", vec![])
            .repo("c", vec![])
            .failing("b");
        let throttle = Throttle::per_window(1, Duration::from_secs(3));

        let start = tokio::time::Instant::now();
        aggregate(&source, "org", &throttle, |_| {}).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(9));
    }
}
