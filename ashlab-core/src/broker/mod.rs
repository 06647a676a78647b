//! Simulated broker: lot ledger, price-band validation, order execution.

pub mod ledger;
pub mod price_band;
pub mod sim_broker;

pub use ledger::{Consumed, LotLedger};
pub use price_band::{allowed_range, Board, PriceBand};
pub use sim_broker::{SimBroker, BOARD_LOT};
