use thiserror::Error;

/// Failures while resolving a source to raw annotation bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Could not fetch '{url}': {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Could not fetch '{url}': server answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Could not fetch '{url}': timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },
    #[error("Could not read '{source_name}': {source}")]
    Read {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
    /// Never returned from a load; only logged.
    #[error("Could not write cache file '{path}': {source}")]
    CacheWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed annotation XML: {0}")]
    Xml(String),
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },
    #[error("<{element}> has non-integer {field} '{value}'")]
    InvalidInteger {
        element: String,
        field: String,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Cannot derive a cache key from an empty source")]
    EmptySource,
}

/// Everything that can make a single `load` call come back empty-handed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Digest(#[from] DigestError),
    #[error("Could not read cache file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
