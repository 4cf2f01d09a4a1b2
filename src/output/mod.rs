//! Output module for archive summaries
//!
//! This module handles reporting on finished or stored archives.

pub mod stats;

pub use stats::{load_statistics, print_statistics, ArchiveStatistics};
