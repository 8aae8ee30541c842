pub mod api;
pub mod app;
pub mod business;
pub mod cache;
pub mod challenge;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod observability;
pub mod security;
