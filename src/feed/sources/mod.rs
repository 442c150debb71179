//! Feed implementations for the supported repository layouts

pub mod listing;
pub mod maven;

pub use listing::DirectoryListingFeed;
pub use maven::MavenMetadataFeed;
