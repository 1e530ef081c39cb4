use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BloxchaserError {
    #[error("failed to load config file using path '{}'. detailed message: {source}", path.display())]
    ConfigLoadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file at '{}': {source}", path.display())]
    ConfigParseFailure {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to create data directory '{}': {source}", path.display())]
    DataDirCreationFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind http listener on {address}: {source}")]
    HttpBindFailure {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to build the shared http client: {source}")]
    HttpClientBuildFailure {
        #[source]
        source: reqwest::Error,
    },
}
