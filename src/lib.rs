// src/lib.rs
pub mod config;
pub mod control_plane;
pub mod error;
pub mod gc;
pub mod membership;
pub mod metrics;
pub mod model;
pub mod provision;
pub mod reconciler;
pub mod resolver;
pub mod server;

pub use error::{Error, RemoteError, Result};
pub use reconciler::{DownOutcome, Reconciler, UpOutcome};
