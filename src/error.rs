use thiserror::Error;

/// Transport or HTTP failure for a single feed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status code: {0}")]
    HttpStatus(u16),

    #[error("response body exceeds {0} bytes")]
    BodyTooLarge(usize),
}

/// Malformed feed document.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Everything that can make one feed contribute zero items.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Fetch(FetchError::Request(err))
    }
}

impl From<roxmltree::Error> for FeedError {
    fn from(err: roxmltree::Error) -> Self {
        FeedError::Parse(ParseError::Xml(err))
    }
}
