//! prasterblaster: parallel raster reprojection
//!
//! Runs one reprojection across a group of ranks. The driver only talks to
//! its peers through [`reproject::Coordinator`]; [`coordinator::ThreadGroup`]
//! provides the group as threads of one process.

pub mod coordinator;
pub mod driver;
pub mod report;

pub use coordinator::{ThreadCoordinator, ThreadGroup};
pub use driver::{load_projection, plan_output, run_rank, RunRequest};
pub use report::{RankReport, RunReport};
