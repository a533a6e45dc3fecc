pub mod agent;
pub mod capture;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod grid;
pub mod motion;
pub mod pursuer;
pub mod rng;
pub mod types;
