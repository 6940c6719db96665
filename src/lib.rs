pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod inspect;
pub mod probe;
pub mod report;
pub mod utils;

pub use error::{AppError, Result};
pub use inspect::{inspect, InspectionResult, View};
