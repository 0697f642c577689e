//! Order status state machine.
//!
//! Sellers move an order forward along
//! `PENDING -> CONFIRMED -> SHIPPED -> DELIVERED`, and may cancel while it
//! is still `PENDING` or `CONFIRMED`. `DELIVERED` and `CANCELLED` are
//! terminal: once reached, no transition out is legal and an order can
//! never be re-opened.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether a seller may move an order from `self` to `requested`.
    pub fn can_transition(self, requested: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, requested),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
        )
    }

    pub fn all() -> [OrderStatus; 5] {
        use OrderStatus::*;
        [Pending, Confirmed, Shipped, Delivered, Cancelled]
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// Rejection message for a disallowed edge, naming the specific pair.
pub fn transition_error(current: OrderStatus, requested: OrderStatus) -> String {
    if current.is_terminal() {
        format!("Order is {current} and can no longer change status")
    } else {
        format!("Cannot change order status from {current} to {requested}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn legal_edges_match_the_adjacency_list() {
        let legal = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Shipped),
            (Confirmed, Cancelled),
            (Shipped, Delivered),
        ];
        for from in OrderStatus::all() {
            for to in OrderStatus::all() {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition(to),
                    expected,
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for from in [Delivered, Cancelled] {
            assert!(from.is_terminal());
            for to in OrderStatus::all() {
                assert!(!from.can_transition(to), "{from} -> {to} must be illegal");
            }
        }
    }

    #[test]
    fn orders_cannot_be_reopened() {
        assert!(!Confirmed.can_transition(Pending));
        assert!(!Shipped.can_transition(Confirmed));
        assert!(!Delivered.can_transition(Shipped));
        assert!(!Cancelled.can_transition(Pending));
    }

    #[test]
    fn rejection_message_names_the_edge() {
        let msg = transition_error(Confirmed, Pending);
        assert!(msg.contains("CONFIRMED") && msg.contains("PENDING"));
        let terminal = transition_error(Delivered, Pending);
        assert!(terminal.contains("no longer"));
    }
}
