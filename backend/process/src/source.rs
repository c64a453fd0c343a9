use std::future::Future;

use crate::{
    error::FetchError,
    models::{PullRequest, Repository},
};

/// Where repositories and their merged pull requests come from.
pub trait Source {
    fn list_repositories(
        &self,
        organization: &str,
    ) -> impl Future<Output = Result<Vec<Repository>, FetchError>> + Send;

    /// Every merged pull request of `full_name` (`owner/repo`), in source order.
    fn merged_pull_requests(
        &self,
        full_name: &str,
    ) -> impl Future<Output = Result<Vec<PullRequest>, FetchError>> + Send;
}
