pub mod config;
pub mod fetch;
pub mod observability;
pub mod sink;
