pub mod aws;
pub mod config;
