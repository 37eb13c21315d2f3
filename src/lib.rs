//! repo-gallery: a terminal gallery for a GitHub user's public repositories.
//!
//! The crate is split into a data pipeline (`github` -> `enrich` -> `fetch`,
//! with `cache` providing the durable layer) and a `tui` front end that
//! renders whatever snapshot the pipeline last published.

pub mod cache;
pub mod config;
pub mod enrich;
pub mod fetch;
pub mod github;
pub mod tui;
