//! Shared domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single room from the fixed hotel inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique room number (e.g. `101`).
    pub id: u32,
    /// Free-text category label, matched case-insensitively.
    pub category: String,
    /// Whether a live reservation currently holds this room.
    pub booked: bool,
}

impl Room {
    /// Create an unbooked room.
    pub fn new(id: u32, category: impl Into<String>) -> Self {
        Self {
            id,
            category: category.into(),
            booked: false,
        }
    }

    /// Returns a user-facing label combining number and category.
    pub fn display_name(&self) -> String {
        format!("Room {} · {}", self.id, self.category)
    }
}

/// A booking held by one customer for exactly one room.
///
/// Rooms are referenced by identifier only; the authoritative `Room`,
/// including its booked flag, lives in the front-desk inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Monotonically assigned identifier, starting at 1.
    pub id: u32,
    /// Customer name as entered.
    pub customer: String,
    /// Identifier of the reserved inventory room.
    pub room_id: u32,
    /// Timestamp when the booking was made.
    pub reserved_at: DateTime<Utc>,
}
