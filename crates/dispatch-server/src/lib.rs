//! Shared library surface for the dispatch server and its tests.

pub mod api;
pub mod config;
pub mod state;
