use chrono::{DateTime, Utc};
use common::{Money, OrderId, PaymentId};
use serde::{Deserialize, Serialize};

/// Lifecycle of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Processing => "Processing",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment attempt for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub payment_method: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Creates a payment in `Processing` state, before the gateway call.
    pub fn processing(order_id: OrderId, amount: Money, payment_method: impl Into<String>) -> Self {
        Self {
            id: PaymentId::new(),
            order_id,
            amount,
            payment_method: payment_method.into(),
            status: PaymentStatus::Processing,
            transaction_id: None,
            error_code: None,
            error_message: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Marks the payment completed with the gateway's transaction id.
    pub fn complete(&mut self, transaction_id: impl Into<String>) {
        self.status = PaymentStatus::Completed;
        self.transaction_id = Some(transaction_id.into());
        self.processed_at = Some(Utc::now());
    }

    /// Marks the payment failed with the gateway's error.
    pub fn fail(&mut self, error_code: impl Into<String>, error_message: impl Into<String>) {
        self.status = PaymentStatus::Failed;
        self.error_code = Some(error_code.into());
        self.error_message = Some(error_message.into());
    }
}
