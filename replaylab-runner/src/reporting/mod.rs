//! Reporting and artifact export.

pub mod artifacts;

pub use artifacts::{save_artifacts, ArtifactManager, ArtifactPaths};
