pub mod ai_gateway;
pub mod cli;
pub mod config;
pub mod interview;
pub mod logging;
