pub mod config;
pub mod db;
pub mod schedule;
pub mod server;
pub mod types;
