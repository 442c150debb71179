//! Game release side: manifests, obfuscation classification and semver
//! normalization of release ids

pub mod aggregator;
pub mod manifest;
pub mod obfuscation;
pub mod semver;
