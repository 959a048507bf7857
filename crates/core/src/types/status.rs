//! Status enums for orders.

use serde::{Deserialize, Serialize};

/// Order status as stored by the order backend.
///
/// The backend stamps every successfully created order as completed; no other
/// lifecycle states exist on the client side. The wire value is the Spanish
/// `"completado"` used by the backend collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "completado")]
    Completed,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completado"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_value() {
        let json = serde_json::to_string(&OrderStatus::Completed).unwrap();
        assert_eq!(json, "\"completado\"");

        let parsed: OrderStatus = serde_json::from_str("\"completado\"").unwrap();
        assert_eq!(parsed, OrderStatus::Completed);
    }
}
