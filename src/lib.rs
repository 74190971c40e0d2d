//! Long-acting injectable plasma level simulator
//!
//! Fits a flip-flop pharmacokinetic model to observed plasma levels or to
//! summary descriptors (tmax, cmax, half-life), generates daily single-dose
//! curves, superposes them for repeated dosing, and samples the result the
//! way a segmented hair strand would record it.

pub mod models;
pub mod concentration;
pub mod fitting;
pub mod curve;
pub mod superposition;
pub mod simulator;
pub mod output;
pub mod parser;
pub mod example_data;
pub mod hair;
pub mod analyser;
pub mod errors;

pub use models::*;
pub use simulator::LaiSimulator;
pub use errors::*;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, SimError>;
