use indexmap::{IndexMap, IndexSet, map::Entry};
use snapshot::RankedEntry;

use crate::models::{PullRequest, User};

pub const POINTS_PER_PR: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionRecord {
    pub avatar_url: String,
    pub login: String,
    pub url: String,
    pub score: u32,
    pub pr_urls: IndexSet<String>,
}

impl ContributionRecord {
    fn new(user: &User) -> Self {
        Self {
            avatar_url: user.avatar_url.clone(),
            login: user.login.clone(),
            url: user.html_url.clone(),
            score: 0,
            pr_urls: IndexSet::new(),
        }
    }

    pub fn pull_request_count(&self) -> usize {
        self.pr_urls.len()
    }
}

/// Per-run ranking table, keyed by user id in first-seen order.
#[derive(Debug, Default)]
pub struct Tally {
    records: IndexMap<u64, ContributionRecord>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits a merged pull request to its author. Returns false if it was already counted.
    pub fn record(&mut self, pull_request: &PullRequest) -> bool {
        let Some(user) = &pull_request.user else {
            return false;
        };

        let record = match self.records.entry(user.id) {
            Entry::Vacant(entry) => entry.insert(ContributionRecord::new(user)),
            Entry::Occupied(entry) => entry.into_mut(),
        };

        if !record.pr_urls.insert(pull_request.html_url.clone()) {
            return false;
        }

        record.score += POINTS_PER_PR;
        true
    }

    #[cfg(test)]
    pub(crate) fn get(&self, user_id: u64) -> Option<&ContributionRecord> {
        self.records.get(&user_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest score first. Equal scores keep first-seen order.
    pub fn into_ranked(self) -> Vec<RankedEntry> {
        let mut records: Vec<ContributionRecord> = self.records.into_values().collect();
        records.sort_by(|a, b| b.score.cmp(&a.score));

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| RankedEntry {
                rank: index + 1,
                no_of_prs: record.pull_request_count(),
                avatar_url: record.avatar_url,
                login: record.login,
                url: record.url,
                score: record.score,
                pr_urls: record.pr_urls.into_iter().collect(),
            })
            .collect()
    }
}
