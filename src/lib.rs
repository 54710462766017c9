pub mod error;
pub mod system;
pub mod partition;
pub mod kernels;
pub mod implementations;
pub mod solver;
pub mod results;
pub mod telemetry;

pub use error::{Result, SolverError};
pub use solver::{solve, SolveReport, SolverConfig, Strategy};
