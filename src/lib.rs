//! netbench: cross-network benchmark and transaction-fee analytics for EVM test networks.

pub mod aligner;
pub mod collector;
pub mod config;
pub mod decoder;
pub mod enricher;
pub mod error;
pub mod model;
pub mod report;
pub mod storage;
pub mod util;
