//! Library surface of the flowgraph CLI: demo workflow assembly and config.
//!
//! The binary (`main.rs`) parses flags, builds the car-description workflow
//! from [`demo`], and drives it through a [`flowgraph::Runner`], answering
//! suspend prompts from stdin. Everything testable lives here.

pub mod config;
pub mod demo;

pub use config::ModelConfig;
pub use demo::{build_car_workflow, initial_car_state, CarModels};
