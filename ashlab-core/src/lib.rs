//! ashlab-core — deterministic A-share backtesting engine.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (bars, lots, orders, trades, positions, account state)
//! - Simulated broker with lot-level T+1 settlement, price-limit bands,
//!   and real transaction costs
//! - Layered risk controls: stop-loss chain + account drawdown ceiling
//! - Market regime filter over the benchmark series
//! - Bar-by-bar event loop producing an auditable trade log and equity
//!   curve, fingerprinted for replay validation

pub mod broker;
pub mod config;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod regime;
pub mod risk;
pub mod signals;

pub use config::{ConfigError, CostConfig, ExecTiming, RunConfig};
