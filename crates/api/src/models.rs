//! Wire types for the Bamboo REST API (`/rest/api/latest`).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Build identifier as reported by the server. Bamboo usually sends an
/// integer, but older servers and proxies have been seen sending strings, so
/// the value is kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildNumber {
    Number(u64),
    Text(String),
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildNumber::Number(n) => write!(f, "{n}"),
            BuildNumber::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for BuildNumber {
    fn from(value: u64) -> Self {
        BuildNumber::Number(value)
    }
}

impl From<&str> for BuildNumber {
    fn from(value: &str) -> Self {
        BuildNumber::Text(value.to_string())
    }
}

/// Outcome of a build. Anything other than the two states the client acts on
/// is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildState {
    Successful,
    Failed,
    Other(String),
}

impl BuildState {
    pub fn as_str(&self) -> &str {
        match self {
            BuildState::Successful => "Successful",
            BuildState::Failed => "Failed",
            BuildState::Other(raw) => raw,
        }
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, BuildState::Successful)
    }
}

impl Default for BuildState {
    fn default() -> Self {
        BuildState::Other("Unknown".to_string())
    }
}

impl From<String> for BuildState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Successful" => BuildState::Successful,
            "Failed" => BuildState::Failed,
            _ => BuildState::Other(value),
        }
    }
}

impl From<BuildState> for String {
    fn from(value: BuildState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a plan's result list. Fields the client does not interpret
/// are preserved in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResult {
    pub number: BuildNumber,
    #[serde(default)]
    pub state: BuildState,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Offset-paged collection envelope shared by `/result` and `/plan`.
///
/// The item list is named `result` or `plan` depending on the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "start-index", default)]
    pub start_index: u64,
    #[serde(rename = "max-result", default)]
    pub max_result: u64,
    #[serde(alias = "result", alias = "plan", default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Offset of the following page, or `None` once `start-index +
    /// max-result` reaches `size`. A page that reports `max-result == 0`
    /// cannot advance the cursor and is treated as the last one.
    pub fn next_start(&self) -> Option<u64> {
        if self.max_result == 0 {
            return None;
        }

        let next = self.start_index + self.max_result;
        (next < self.size).then_some(next)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultsEnvelope<T> {
    pub results: Option<Page<T>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub key: String,
    pub name: String,
}

/// Latest state and number of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStatus {
    pub state: BuildState,
    pub number: BuildNumber,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LifeCycle {
    #[serde(rename = "lifeCycleState")]
    pub life_cycle_state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ChangesPayload {
    #[serde(default)]
    pub changes: Option<ChangeList>,
    #[serde(rename = "buildReason", default)]
    pub build_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ChangeList {
    #[serde(default)]
    pub change: Vec<Change>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Change {
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct JiraIssuesPayload {
    #[serde(rename = "jiraIssues", default)]
    pub jira_issues: Option<JiraIssueList>,
    #[serde(rename = "buildReason", default)]
    pub build_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct JiraIssueList {
    #[serde(default)]
    pub issue: Vec<JiraIssue>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JiraIssue {
    pub key: Option<String>,
}
