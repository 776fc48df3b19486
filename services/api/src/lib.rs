//! services/api/src/lib.rs
//!
//! The API service library: configuration, concrete adapters for the core
//! ports, and the axum web layer. The `api` binary wires these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
