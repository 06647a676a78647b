//! Core domain types: bars, lots, orders, trades, positions, account state.

pub mod account;
pub mod bar;
pub mod lot;
pub mod order;
pub mod position;
pub mod trade;

pub use account::AccountState;
pub use bar::Bar;
pub use lot::Lot;
pub use order::{Order, OrderReject, OrderSide, OrderSize, OrderSource};
pub use position::PositionView;
pub use trade::{StopKind, TradeRecord, TradeStatus};
