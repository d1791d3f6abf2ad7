//! Quadratic-program solver for the maximum-margin classifier
//!
//! Sequential Minimal Optimization over the kernel seam, plus Platt
//! calibration of decision values into class probabilities.

pub mod platt;
pub mod smo;

pub use self::platt::{fit_sigmoid, Sigmoid};
pub use self::smo::{SmoSolver, SolveResult};
