pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod file_ops;
pub mod lock;
pub mod resolver;
pub mod triggers;
pub mod ui;
pub mod vcs;
pub mod workflow;

pub use error::{AutoverError, Result};
