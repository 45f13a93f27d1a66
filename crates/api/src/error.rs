use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Any status other than `200 OK`, regardless of the body.
    #[error("Unreachable endpoint")]
    UnreachableEndpoint { status: u16 },

    #[error("The plan doesn't contain any result")]
    EmptyResult,

    #[error("The plan doesn't contain any successful build")]
    NoSuccessfulBuild,

    #[error("No plans available")]
    NoPlansAvailable,

    #[error("No builds available")]
    NoBuildsAvailable,

    #[error("Unexpected response: {0}")]
    MalformedResponse(String),

    #[error("Invalid JSON response: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Dependent build chain exceeded {limit} levels")]
    DependencyChainTooDeep { limit: usize },

    #[error("Pagination exceeded {limit} pages")]
    PageLimitExceeded { limit: usize },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UnreachableEndpoint { status } => Some(*status),
            ApiError::RequestFailed(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ApiError::UnreachableEndpoint { status: 401 | 403 } => {
                Some("Verify your credentials using: bamboo-cli login")
            }
            ApiError::UnreachableEndpoint { status: 404 } => {
                Some("Check if the plan or build key is correct")
            }
            ApiError::RequestFailed(_) => {
                Some("Check the host URL and your network connection")
            }
            ApiError::InvalidUrl(_) => Some("The host must look like http://hostname:8085"),
            ApiError::DependencyChainTooDeep { .. } => {
                Some("The build reasons may form a cycle; raise max_chain_depth if not")
            }
            ApiError::PageLimitExceeded { .. } => {
                Some("Narrow the query parameters or raise max_pages")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
