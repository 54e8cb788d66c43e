//! UUID-backed identifier newtypes.
//!
//! Wrapping the raw UUID gives type safety: an `OrderId` cannot be passed
//! where a `CustomerId` is expected, even though both are UUIDs on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Identifier of an aggregate in the event store.
    ///
    /// In this system the order is the only event-sourced aggregate, so an
    /// `AggregateId` is usually a converted [`OrderId`], but the event store
    /// itself stays agnostic of what it is logging.
    AggregateId
}

uuid_id! {
    /// Unique identifier of an order.
    OrderId
}

uuid_id! {
    /// Unique identifier of a customer.
    CustomerId
}

uuid_id! {
    /// Unique identifier of a product.
    ProductId
}

uuid_id! {
    /// Unique identifier of an inventory reservation.
    ReservationId
}

uuid_id! {
    /// Unique identifier of a payment.
    PaymentId
}

uuid_id! {
    /// Unique identifier of a notification.
    NotificationId
}

uuid_id! {
    /// Unique identifier of a published event.
    EventId
}

impl From<OrderId> for AggregateId {
    fn from(id: OrderId) -> Self {
        Self::from_uuid(id.as_uuid())
    }
}
