pub mod app;
pub mod config;
pub mod core;
pub mod endpoint;
pub mod reconcile;
pub mod staging;
pub mod transfer;
