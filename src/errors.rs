#[derive(Debug)]
pub enum LinkSeekError {
    Io {
        source: std::io::Error,
        path: Option<std::path::PathBuf>,
    },
    ParseError {
        msg: String,
    },
    ConfigError {
        msg: String,
    },
    ThreadPool {
        msg: String,
    },
}

impl std::fmt::Display for LinkSeekError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for LinkSeekError {}

pub type Result<T> = std::result::Result<T, LinkSeekError>;

impl From<std::io::Error> for LinkSeekError {
    fn from(x: std::io::Error) -> Self {
        Self::Io {
            source: x,
            path: None,
        }
    }
}

impl From<serde_json::Error> for LinkSeekError {
    fn from(x: serde_json::Error) -> Self {
        Self::ParseError { msg: x.to_string() }
    }
}

impl From<csv::Error> for LinkSeekError {
    fn from(x: csv::Error) -> Self {
        Self::ParseError { msg: x.to_string() }
    }
}
