pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod template;
pub mod ui;
pub mod updater;
pub mod vcs;

pub use client::{BumpClient, BumpOptions, BumpResult, BumpStage, OutputFormat};
pub use config::Configuration;
pub use error::{BumpvError, Result};
