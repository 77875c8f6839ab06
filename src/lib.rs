//! MCP server exposing National Weather Service alerts and forecasts as tools.

pub mod client;
pub mod constants;
pub mod error;
pub mod formatters;
pub mod models;
pub mod service;
pub mod tools;

pub use client::{Fetcher, NwsClient};
pub use error::FetchError;
pub use service::Weather;
