#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod cycle;
pub mod feed;
pub mod graph;

pub use config::GraphConfig;
pub use cycle::{CycleError, CyclePipeline};
pub use feed::{Extraction, FeedError};
pub use graph::{GraphClient, GraphError, MessageSummary};
