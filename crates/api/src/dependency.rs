//! Follows the "Child of" link in a build's reason up to the build that
//! triggered it, collecting items from every level of the chain.

use std::hash::Hash;

use async_trait::async_trait;
use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::models::{ChangesPayload, JiraIssuesPayload};
use crate::BambooClient;

pub const CHILD_MARKER: &str = "Child of";

/// Extracts the upstream build key from a build reason such as
/// `Child of <a href="/browse/PRJ-PLAN-99">PRJ-PLAN-99</a>`.
///
/// The key is the text after the first `>` following the marker, up to the
/// closing `</a>` when there is one. Returns `None` when the marker is
/// absent or no key can be located after it.
pub fn upstream_build_key(reason: &str) -> Option<&str> {
    let marker = reason.find(CHILD_MARKER)?;
    let after_marker = &reason[marker + CHILD_MARKER.len()..];
    let anchor = after_marker.find('>')?;
    let text = &after_marker[anchor + 1..];
    let key = text.find("</a>").map_or(text, |end| &text[..end]).trim();

    (!key.is_empty()).then_some(key)
}

/// Items attached to one build plus the reason it was triggered.
#[derive(Debug, Clone)]
pub struct LinkedBuild<T> {
    pub items: Vec<T>,
    pub build_reason: Option<String>,
}

#[async_trait]
pub trait LinkedBuildSource<T>: Sync {
    async fn fetch_linked(&self, build_key: &str) -> Result<LinkedBuild<T>>;

    /// Maximum number of upstream hops. `None` follows the chain until a
    /// build reason without the marker, which never ends on cyclic data.
    fn max_depth(&self) -> Option<usize> {
        None
    }

    /// Collects items from `build_key` and every upstream build, keeping the
    /// first occurrence of each item. Items of a build precede those of its
    /// upstream build. Any failure aborts the whole walk.
    async fn collect_transitive(&self, build_key: &str) -> Result<Vec<T>>
    where
        T: Eq + Hash + Send,
    {
        let mut collected = IndexSet::new();
        let mut current = build_key.to_string();
        let mut depth = 0;

        loop {
            debug!(build_key = %current, depth, "Fetching linked build");
            let linked = self.fetch_linked(&current).await?;
            collected.extend(linked.items);

            let Some(reason) = linked.build_reason.as_deref() else {
                break;
            };

            let Some(upstream) = upstream_build_key(reason) else {
                if reason.contains(CHILD_MARKER) {
                    warn!(build_key = %current, reason, "Build reason names no upstream build");
                }
                break;
            };

            depth += 1;
            if let Some(limit) = self.max_depth() {
                if depth > limit {
                    return Err(ApiError::DependencyChainTooDeep { limit });
                }
            }

            debug!(from = %current, to = upstream, "Following dependent plan");
            current = upstream.to_string();
        }

        Ok(collected.into_iter().collect())
    }
}

/// Commit authors (`changes.change[].fullName`) of a build.
pub struct ChangeSource<'a> {
    client: &'a BambooClient,
}

impl<'a> ChangeSource<'a> {
    pub fn new(client: &'a BambooClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'a> LinkedBuildSource<String> for ChangeSource<'a> {
    async fn fetch_linked(&self, build_key: &str) -> Result<LinkedBuild<String>> {
        let payload: ChangesPayload = self
            .client
            .get_json(self.client.build_url(build_key, Some("expand=changes"))?)
            .await?;

        let items = payload
            .changes
            .unwrap_or_default()
            .change
            .into_iter()
            .filter_map(|change| change.full_name)
            .collect();

        Ok(LinkedBuild {
            items,
            build_reason: payload.build_reason,
        })
    }

    fn max_depth(&self) -> Option<usize> {
        self.client.options().max_chain_depth
    }
}

/// Linked JIRA issue keys (`jiraIssues.issue[].key`) of a build.
pub struct JiraIssueSource<'a> {
    client: &'a BambooClient,
}

impl<'a> JiraIssueSource<'a> {
    pub fn new(client: &'a BambooClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'a> LinkedBuildSource<String> for JiraIssueSource<'a> {
    async fn fetch_linked(&self, build_key: &str) -> Result<LinkedBuild<String>> {
        let payload: JiraIssuesPayload = self
            .client
            .get_json(self.client.build_url(build_key, Some("expand=jiraIssues"))?)
            .await?;

        let items = payload
            .jira_issues
            .unwrap_or_default()
            .issue
            .into_iter()
            .filter_map(|issue| issue.key)
            .collect();

        Ok(LinkedBuild {
            items,
            build_reason: payload.build_reason,
        })
    }

    fn max_depth(&self) -> Option<usize> {
        self.client.options().max_chain_depth
    }
}
