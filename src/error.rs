use thiserror::Error;

#[derive(Debug, Error)]
pub enum HunterError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scheduler error: {0}")]
    Scheduler(String),
}

impl HunterError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        HunterError::Io {
            path: path.into(),
            source,
        }
    }
}
