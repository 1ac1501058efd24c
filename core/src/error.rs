use thiserror::Error;

/// Fatal errors surfaced by a scan. Nothing is reported when one of these
/// is returned.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid target URL: {0}")]
    InvalidTarget(String),

    #[error("could not resolve host '{host}'")]
    Resolution { host: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Per-probe failure. Always recovered inside the engine and mapped to
/// "no contribution" for that probe.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid probe URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised while loading an external knowledge-base file.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("failed to read knowledge base '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse knowledge base: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("base score {score} for {key} is outside [0, 10]")]
    ScoreOutOfRange { key: String, score: f64 },
}
