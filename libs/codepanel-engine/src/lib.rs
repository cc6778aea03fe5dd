pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod gate;
pub mod harness;
pub mod session;
pub mod store;
