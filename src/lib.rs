// ABOUTME: Root library module exposing all public modules
// ABOUTME: Service side of the butler: config, surfaces, network gears, HTTP server and ticker

pub mod butler;
pub mod config;
pub mod gears;
pub mod metrics;
pub mod paths;
pub mod scheduler;
pub mod surfaces;
pub mod webhook;
