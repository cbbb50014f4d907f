pub mod browser;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod files;
pub mod output;
pub mod runner;
pub mod server;
