use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapsError>;

#[derive(Debug, Error)]
pub enum MapsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Distance Matrix API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The API answered 200 but the top-level status was not OK
    /// (e.g. OVER_QUERY_LIMIT, REQUEST_DENIED).
    #[error("Distance Matrix status {0}")]
    Status(String),

    /// A specific origin/destination element could not be routed
    /// (NOT_FOUND, ZERO_RESULTS).
    #[error("no route for element: {0}")]
    NoRoute(String),
}
