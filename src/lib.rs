//! Sales sheet analysis: header role detection, fuzzy product merging and
//! ranked views (fast/slow movers, sales contribution, profitability).
//!
//! The flow is loader -> [`session::Session`] (role detection or a manual
//! mapping, then aggregation) -> [`analysis::analyze`] -> [`output`].

pub mod aggregate;
pub mod analysis;
pub mod cli;
pub mod error;
pub mod loader;
pub mod logging;
pub mod output;
pub mod roles;
pub mod session;
pub mod similarity;
pub mod types;
pub mod util;

pub use analysis::{AnalysisMode, AnalysisResult};
pub use error::{AnalysisError, LoadError, OutputError};
pub use session::Session;
