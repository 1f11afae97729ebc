//! Simple Stats: self-hosted page-visit statistics.
//!
//! Records page views (URL, referer, user agent, IP, timestamp) into a
//! DuckDB-backed visit log and serves five ranked frequency tables — top
//! pages, referers, IP addresses, browsers, and operating systems — plus
//! an admin-gated purge of all collected data.

pub mod api;
pub mod config;
pub mod ingest;
pub mod query;
pub mod server;
pub mod storage;
