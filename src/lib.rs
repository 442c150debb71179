//! Reconciles game release manifests with Maven artifact feeds into one
//! queryable, atomically published version snapshot.
//!
//! # Modules
//!
//! - [`feed`]: Artifact feed fetching, entry construction and stability
//! - [`release`]: Release manifests, obfuscation classification, semver
//! - [`snapshot`]: Reconciliation and the published [`snapshot::VersionDatabase`]
//! - [`refresh`]: The recurring refresh service
//! - [`cache`]: SQLite persistence for the classifier and manifest copies

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod logging;
pub mod refresh;
pub mod release;
pub mod snapshot;
