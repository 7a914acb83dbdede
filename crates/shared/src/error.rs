use thiserror::Error;

/// Failures while bringing up the atlas. All of them are fatal to startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to load {url} (HTTP {status})")]
    Status { url: String, status: u16 },

    #[error("invalid data document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("data document must be an array or an object, found {0}")]
    Shape(&'static str),
}
