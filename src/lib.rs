//! Dashboard News - the news ticker backend of the trade-marketing dashboard
//!
//! This crate fetches a configured list of RSS and Atom feeds, normalizes
//! their items into one shape, and serves the merged, de-duplicated and
//! newest-first list over HTTP.

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod routes;
