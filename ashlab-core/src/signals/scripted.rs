//! Scripted strategy — replays a fixed signal table.
//!
//! The test collaborator for the engine: deterministic by construction,
//! it emits exactly the signals it was given on the dates it was given
//! them and holds otherwise.

use super::{BarContext, SignalEvent, Strategy};
use chrono::NaiveDate;

pub struct Scripted {
    script: Vec<(NaiveDate, SignalEvent)>,
}

impl Scripted {
    pub fn new(mut script: Vec<(NaiveDate, SignalEvent)>) -> Self {
        script.sort_by(|a, b| (a.0, &a.1.symbol).cmp(&(b.0, &b.1.symbol)));
        Self { script }
    }

    pub fn empty() -> Self {
        Self { script: Vec::new() }
    }
}

impl Strategy for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<SignalEvent> {
        self.script
            .iter()
            .filter(|(date, _)| *date == ctx.date)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalKind;

    #[test]
    fn script_is_sorted_for_determinism() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let strategy = Scripted::new(vec![
            (
                d,
                SignalEvent {
                    symbol: "600519".into(),
                    kind: SignalKind::Hold,
                    confidence: 0.0,
                },
            ),
            (
                d,
                SignalEvent {
                    symbol: "000001".into(),
                    kind: SignalKind::Hold,
                    confidence: 0.0,
                },
            ),
        ]);
        assert_eq!(strategy.script[0].1.symbol, "000001");
    }
}
