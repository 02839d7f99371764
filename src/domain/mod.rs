//! Domain logic - version parsing, bumping and serialization independent of files and VCS

pub mod part;
pub mod version;
pub mod version_config;

pub use part::{PartConfig, PartKind, VersionPart};
pub use version::Version;
pub use version_config::VersionConfig;
