use thiserror::Error;

#[derive(Debug, Error)]
pub enum SunburstError {
    #[error("malformed tree: {0}")]
    MalformedTree(String),

    #[error("node reference from layout pass {held} used against pass {current}")]
    StaleNode { held: u64, current: u64 },

    #[error("node \"{0}\" no longer exists")]
    NodeNotFound(String),

    #[error("selected node \"{0}\" disappeared after refresh")]
    SelectionStaleAfterRefresh(String),

    #[error("failed to fetch tree: {0}")]
    Fetch(String),
}

impl SunburstError {
    pub(crate) fn fetch(error: &anyhow::Error) -> Self {
        Self::Fetch(format!("{error:#}"))
    }

    /// Whether the host should show this error to the user instead of only logging it.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::StaleNode { .. })
    }
}

pub type Result<T, E = SunburstError> = std::result::Result<T, E>;
