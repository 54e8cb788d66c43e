//! External payment gateway abstraction.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use common::Money;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{info, warn};
use uuid::Uuid;

/// Result of a gateway call: approved with a transaction id, or declined
/// with an error code and message. Declines are domain outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Approved {
        transaction_id: String,
    },
    Declined {
        error_code: String,
        message: String,
    },
}

/// Seam to the real payment provider. The reference implementation below is
/// a mock; a production client can replace it without touching callers.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn process(&self, amount: Money, payment_method: &str) -> GatewayOutcome;
}

/// Mock gateway: simulated latency plus an injected, seedable RNG deciding
/// approval. Pure function of the RNG state, so tests can pin the outcome.
pub struct MockPaymentGateway {
    success_rate: f64,
    latency: Duration,
    rng: Mutex<StdRng>,
}

impl MockPaymentGateway {
    /// Gateway approving ~90% of charges, the reference behavior.
    pub fn new() -> Self {
        Self {
            success_rate: 0.9,
            latency: Duration::ZERO,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Gateway with a deterministic RNG seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            success_rate: 0.9,
            latency: Duration::ZERO,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Gateway that approves every charge.
    pub fn always_approve() -> Self {
        Self {
            success_rate: 1.0,
            latency: Duration::ZERO,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Gateway that declines every charge.
    pub fn always_decline() -> Self {
        Self {
            success_rate: 0.0,
            latency: Duration::ZERO,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Adds simulated processing latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn process(&self, amount: Money, payment_method: &str) -> GatewayOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let approved = self.rng.lock().unwrap().gen_bool(self.success_rate);

        if approved {
            let transaction_id = format!("TXN-{}", Uuid::new_v4().simple());
            info!(%amount, payment_method, %transaction_id, "payment approved");
            metrics::counter!("payments_approved_total").increment(1);
            GatewayOutcome::Approved { transaction_id }
        } else {
            warn!(%amount, payment_method, "payment declined");
            metrics::counter!("payments_declined_total").increment(1);
            GatewayOutcome::Declined {
                error_code: "INSUFFICIENT_FUNDS".to_string(),
                message: "Payment declined by gateway".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_approve_yields_transaction_ids() {
        let gateway = MockPaymentGateway::always_approve();
        match gateway.process(Money::from_cents(5000), "CreditCard").await {
            GatewayOutcome::Approved { transaction_id } => {
                assert!(transaction_id.starts_with("TXN-"));
            }
            GatewayOutcome::Declined { .. } => panic!("expected approval"),
        }
    }

    #[tokio::test]
    async fn always_decline_yields_error_code() {
        let gateway = MockPaymentGateway::always_decline();
        match gateway.process(Money::from_cents(5000), "CreditCard").await {
            GatewayOutcome::Declined { error_code, .. } => {
                assert_eq!(error_code, "INSUFFICIENT_FUNDS");
            }
            GatewayOutcome::Approved { .. } => panic!("expected decline"),
        }
    }

    #[tokio::test]
    async fn seeded_gateway_is_deterministic() {
        let a = MockPaymentGateway::with_seed(42);
        let b = MockPaymentGateway::with_seed(42);

        for _ in 0..16 {
            let outcome_a = a.process(Money::from_cents(100), "CreditCard").await;
            let outcome_b = b.process(Money::from_cents(100), "CreditCard").await;
            // Transaction ids differ, but the approve/decline decision must
            // follow the same sequence.
            assert_eq!(
                matches!(outcome_a, GatewayOutcome::Approved { .. }),
                matches!(outcome_b, GatewayOutcome::Approved { .. }),
            );
        }
    }
}
