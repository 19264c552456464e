//! Acquisition Leads Library
//!
//! Rule-based filtering and scoring of small-business acquisition leads

pub mod types;
pub mod error;
pub mod config;
pub mod normalize;
pub mod filter;
pub mod business_type;
pub mod link_health;
pub mod warnings;
pub mod scoring;
pub mod pipeline;
pub mod report;
pub mod storage;

pub use types::*;
