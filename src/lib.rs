pub mod app;
pub mod config;
pub mod debounce;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod tmdb;
