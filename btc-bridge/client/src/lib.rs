mod api;
pub use api::*;

mod cli;
pub use cli::*;

mod config;
pub use config::{load_bridge_config, BridgeConfig, TrackerSection};

mod logging;
pub use logging::{init_tracing, LogFormat};

pub mod deposit;
pub mod error;
pub mod provider;
pub mod signer;
pub mod tracker;
pub mod types;
