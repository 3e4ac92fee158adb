//! Back-office API client library
//!
//! An async client for the back-office REST backend plus the in-memory
//! collection manager that powers searchable, sortable, editable tables.

pub mod api;
pub mod auth;
pub mod error;
pub mod manager;
pub mod model;
pub mod query;
pub mod text;

mod client;

pub use client::*;
