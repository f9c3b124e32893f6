//! Spot-price movement scanner core.
//!
//! History, classification, throttling and rendering are synchronous and
//! owned by [`manager::MarketManager`]; [`scanner::Scanner`] drives them on a
//! fixed cadence against the collaborator traits in [`feed`].

pub mod config;
pub mod error;
pub mod feed;
pub mod format;
pub mod history;
pub mod manager;
pub mod pairs;
pub mod pulse;
pub mod retry;
pub mod rolling_window;
pub mod scanner;
pub mod throttle;
pub mod time;
pub mod types;

pub use config::ScannerConfig;
pub use error::MarketError;
pub use scanner::{Scanner, Sinks};
pub use types::{MovementEvent, MovementKind, Pair, Sample, WickDirection};
