//! Test utilities shared by the integration tests

mod server;

pub use server::*;
