pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod scenarios;
pub mod state;
