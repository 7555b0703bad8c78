//! Literacy need index, budget allocation, trend projection and
//! cost-effectiveness ranking.

pub mod allocation;
pub mod config;
pub mod dataset;
pub mod effectiveness;
pub mod error;
pub mod index;
pub mod indicators;
pub mod output;
pub mod projection;
pub mod report;
pub mod server;
