//! Downloads web pages to disk and keeps a JSON index of their link count,
//! image count and last fetch time.

pub mod config;
pub mod downloader;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod scanner;
pub mod store;
