use serde::Deserialize;

pub const ENDPOINT: &str = "https://api.github.com";

pub const ACCEPT: &str = "application/vnd.github.v3+json";
pub const USER_AGENT: &str = "org-leaderboard";

pub const PER_PAGE: usize = 100;

// Search API refuses to page past the first 1000 results
pub const SEARCH_RESULT_LIMIT: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub total_count: usize,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<PullRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub html_url: String,
    // null for deleted accounts
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
}
