/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{source}")]
    Config {
        #[from]
        source: crate::config::Error,
    },
    #[error("{source}")]
    Ccl {
        #[from]
        source: crate::ccl::Error,
    },
    #[error("{source}")]
    Tracker {
        #[from]
        source: crate::tracker::Error,
    },
    #[error("{source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("{source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
    #[error("malformed tracks/bounding-box file: {0}")]
    ParseError(String),
}
