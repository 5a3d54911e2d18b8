//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod strategy;
pub mod simulator;
pub mod analyzer;
pub mod asset;
pub mod portfolio;
pub mod universe;
pub mod monitor;
pub mod config_validation;
pub mod error;
