//! Run fingerprinting — content hashes for replay validation.
//!
//! Determinism contract: two runs with identical inputs must produce
//! byte-identical trade logs and equity curves. Hashing both collapses
//! that comparison to fingerprint equality, cheap enough to assert in
//! validation re-runs.

use crate::domain::TradeRecord;
use crate::engine::result::EquityPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    /// blake3 hex of the serialized trade log.
    pub trades_hash: String,
    /// blake3 hex of the serialized equity curve.
    pub equity_hash: String,
}

impl RunFingerprint {
    pub fn compute(trades: &[TradeRecord], equity_curve: &[EquityPoint]) -> Self {
        Self {
            trades_hash: hash_json(trades),
            equity_hash: hash_json(equity_curve),
        }
    }
}

fn hash_json<T: Serialize + ?Sized>(value: &T) -> String {
    let json = serde_json::to_vec(value).expect("run artifacts must serialize");
    blake3::hash(&json).to_hex().to_string()
}
