//! Order lifecycle state machines.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// Production stage of an order. Moves strictly forward, one step at a
/// time; `Delivered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Received,
    Cutting,
    Stitching,
    Ready,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "received",
            OrderStatus::Cutting => "cutting",
            OrderStatus::Stitching => "stitching",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "received" => Ok(OrderStatus::Received),
            "cutting" => Ok(OrderStatus::Cutting),
            "stitching" => Ok(OrderStatus::Stitching),
            "ready" => Ok(OrderStatus::Ready),
            "delivered" => Ok(OrderStatus::Delivered),
            other => Err(StoreError::decode(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }

    /// The next stage, or an `InvalidTransition` at the terminal stage.
    pub fn advance(&self) -> Result<Self> {
        match self {
            OrderStatus::Received => Ok(OrderStatus::Cutting),
            OrderStatus::Cutting => Ok(OrderStatus::Stitching),
            OrderStatus::Stitching => Ok(OrderStatus::Ready),
            OrderStatus::Ready => Ok(OrderStatus::Delivered),
            OrderStatus::Delivered => Err(StoreError::invalid_transition(
                "order is already delivered",
            )),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

/// Payment settlement flag. One-way `Unpaid -> Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(StoreError::decode(format!(
                "unknown payment status '{}'",
                other
            ))),
        }
    }

    /// Settles the order, or an `InvalidTransition` if already paid.
    pub fn settle(&self) -> Result<Self> {
        match self {
            PaymentStatus::Unpaid => Ok(PaymentStatus::Paid),
            PaymentStatus::Paid => Err(StoreError::invalid_transition("order is already paid")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_forward_chain() {
        let mut status = OrderStatus::Received;
        let expected = ["cutting", "stitching", "ready", "delivered"];
        for want in expected {
            status = status.advance().unwrap();
            assert_eq!(status.as_str(), want);
        }
        assert!(status.is_terminal());
    }

    #[test]
    fn test_delivered_is_terminal() {
        let err = OrderStatus::Delivered.advance().unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));
    }

    #[test]
    fn test_parse_round_trip() {
        for s in ["received", "cutting", "stitching", "ready", "delivered"] {
            assert_eq!(OrderStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(OrderStatus::parse("shipped").is_err());
    }

    #[test]
    fn test_payment_settle_once() {
        let paid = PaymentStatus::Unpaid.settle().unwrap();
        assert_eq!(paid.as_str(), "paid");
        assert!(matches!(
            paid.settle(),
            Err(StoreError::InvalidTransition(_))
        ));
    }
}
