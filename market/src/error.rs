use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("pair list file {path}: {source}")]
    PairFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scanner configuration: {0}")]
    InvalidConfig(String),
}
