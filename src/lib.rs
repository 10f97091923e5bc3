pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod http;
pub mod logging;
pub mod students;
