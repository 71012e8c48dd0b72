use serde::{Deserialize, Serialize};

/// A driver's proposed fare for a requested ride. Competes with other
/// bids until the passenger accepts one, after which none remain
/// actionable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub driver: String,
    pub amount: f64,
    pub status: Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Accepted,
    Rejected,
}

impl Bid {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, Status::Pending)
    }
}
