use serde::{Deserialize, Serialize};

/// Per-agent account state. Lives for exactly one window; re-initialized at
/// window start from the arena's initial balance for the quote asset.
///
/// Position is signed: positive = long, negative = short. Opening a position
/// does not move cash; cash changes only by realized PnL, fees, and funding.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub cash: f64,
    pub position: f64,
    pub avg_entry_price: f64,
}

impl Account {
    pub fn new(cash: f64) -> Self {
        Self {
            cash,
            position: 0.0,
            avg_entry_price: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position == 0.0
    }
}
