//! Reconciled version snapshot: building, querying and publishing it

pub mod database;
pub mod published;
pub mod reconcile;

pub use database::{FeedSet, IdentifierMapping, VersionDatabase};
pub use published::PublishedDatabase;
pub use reconcile::VersionReconciler;
