use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoinbaseError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from coinbase: {0}")]
    InvalidResponse(String),

    #[error("numeric parse error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),
}
