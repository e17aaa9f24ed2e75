pub mod analyzer;
pub mod classifier;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod preprocess;
pub mod segment;
pub mod signal;
pub mod smoothing;

pub use analyzer::*;
pub use classifier::*;
pub use error::*;
pub use signal::*;
