use reqwest::StatusCode;
use thiserror::Error;

/// Ways the portal's markup or payloads can fail to look the way we expect.
///
/// These are never transient: seeing one means the upstream site changed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("page has no <body class=\"page-body\"> element")]
    NoBodyMarker,
    #[error("no inline script assigns the initial page state")]
    NoScriptMatch,
    #[error("embedded json is malformed: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("field `{0}` is missing")]
    MissingField(&'static str),
    #[error("print version link has no href")]
    PrintLinkWithoutHref,
    #[error("print version link `{0}` is not a valid url")]
    InvalidPrintLink(String),
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("authentication failed: feed returned {status}")]
    Auth { status: StatusCode },
    #[error("unexpected upstream structure: {0}")]
    Structural(#[from] ExtractError),
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed session: {0}")]
    MalformedSession(String),
}

impl ScrapeError {
    /// Stable label used in logs and error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Auth { .. } => "auth",
            ScrapeError::Structural(_) => "structural",
            ScrapeError::Status { .. } | ScrapeError::Network(_) => "network",
            ScrapeError::MalformedSession(_) => "session",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ScrapeError::Network(e) if e.is_timeout())
    }
}
