#![doc = include_str!("../../README.md")]
//! Crate-specific API surface for `geopack-sqlite`.
//!
//! [`register_functions`] installs the geometry functions the spatial-index
//! triggers call plus the index-management functions. [`ddl`] exposes the
//! generated SQL text for callers that manage their schema themselves.

pub mod ddl;
mod ffi;
mod sqlite_compat;
pub use ffi::register_functions;
