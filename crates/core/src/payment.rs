//! Simulated payment settlement.

use std::time::Duration;

use tokio::time;
use tracing::info;

/// Pretends to charge the customer after a successful booking.
///
/// The delay is purely cosmetic and never fails; tests construct the
/// clerk with `Duration::ZERO`.
#[derive(Debug, Clone)]
pub struct PaymentClerk {
    delay: Duration,
}

impl PaymentClerk {
    /// Create a clerk with the given settlement delay.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Simulate processing the payment for a reservation.
    pub async fn settle(&self, reservation_id: u32) {
        info!(reservation = reservation_id, "processing payment");
        time::sleep(self.delay).await;
        info!(reservation = reservation_id, "payment settled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_delay_settles_immediately() {
        let clerk = PaymentClerk::new(Duration::ZERO);
        clerk.settle(1).await;
    }
}
