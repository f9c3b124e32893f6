pub mod client;
pub mod errors;
pub mod parser;
pub mod types;

pub use client::CoinbaseClient;
pub use errors::CoinbaseError;
