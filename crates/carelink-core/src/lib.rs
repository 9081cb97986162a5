//! Core types and trait definitions for the CareLink identity platform.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod error;
pub mod facility;
pub mod identity;
pub mod material;
pub mod notify;
pub mod store;
pub mod user;

pub use error::{Error, Result};
