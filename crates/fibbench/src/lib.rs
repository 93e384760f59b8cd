//! fibbench library: application logic for the Fibonacci benchmark.

pub mod app;
pub mod config;
pub mod errors;
pub mod version;
pub mod worker;
