//! Order types and the remote order backend collaborator.
//!
//! Orders are owned by the remote system of record. The client submits an
//! [`OrderDraft`]; the backend stamps the server timestamp and the completed
//! status and returns the assigned id. No order is observable anywhere until
//! that call returns successfully.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use botilleria_core::{OrderId, OrderStatus, Price, ProductId};

/// One line of a submitted order: the cart line minus presentation fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
}

/// What the client sends to the backend.
///
/// Deliberately carries no client-generated request identifier: a retried
/// submission is a new order from the backend's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub items: Vec<OrderLine>,
    pub total: Price,
    pub user_email: String,
}

/// A completed order as the backend records it. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderLine>,
    pub total: Price,
    pub user_email: String,
    /// Server-assigned creation timestamp.
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
}

/// Errors from the remote order backend. Transient by classification: they
/// surface to the visitor and are never auto-retried.
#[derive(Debug, Error)]
pub enum OrderBackendError {
    #[error("order backend unavailable: {0}")]
    Unavailable(String),
    #[error("order rejected: {0}")]
    Rejected(String),
}

/// The remote order backend collaborator.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Create an order from a draft. The backend assigns the id, the server
    /// timestamp, and the completed status.
    async fn create_order(&self, draft: OrderDraft) -> Result<OrderId, OrderBackendError>;
}

/// In-memory order backend for tests and offline development.
///
/// Mirrors the remote contract: stamps `Utc::now()` and
/// [`OrderStatus::Completed`], assigns a random id, and records the order.
#[derive(Debug, Default)]
pub struct InMemoryOrderBackend {
    orders: Mutex<Vec<Order>>,
    fail_next: AtomicBool,
}

impl InMemoryOrderBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrange for the next `create_order` call to fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// All orders recorded so far, in creation order.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.orders
            .lock()
            .map(|orders| orders.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OrderBackend for InMemoryOrderBackend {
    async fn create_order(&self, draft: OrderDraft) -> Result<OrderId, OrderBackendError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(OrderBackendError::Unavailable(
                "simulated outage".to_owned(),
            ));
        }

        let order = Order {
            id: OrderId::new(Uuid::new_v4().simple().to_string()),
            items: draft.items,
            total: draft.total,
            user_email: draft.user_email,
            date: Utc::now(),
            status: OrderStatus::Completed,
        };
        let id = order.id.clone();

        if let Ok(mut orders) = self.orders.lock() {
            info!(order_id = %id, total = %order.total, "order recorded");
            orders.push(order);
        }

        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> OrderDraft {
        OrderDraft {
            items: vec![OrderLine {
                id: ProductId::new("vino-1"),
                name: "Vino Tinto Reserva".to_owned(),
                price: Price::new(5990),
                quantity: 2,
            }],
            total: Price::new(11_980),
            user_email: "a@b.com".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_create_order_stamps_status_and_id() {
        let backend = InMemoryOrderBackend::new();
        let id = backend.create_order(draft()).await.unwrap();
        assert!(!id.as_str().is_empty());

        let orders = backend.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, id);
        assert_eq!(orders[0].status, OrderStatus::Completed);
        assert_eq!(orders[0].user_email, "a@b.com");
    }

    #[tokio::test]
    async fn test_fail_next_fails_exactly_once() {
        let backend = InMemoryOrderBackend::new();
        backend.fail_next();

        assert!(backend.create_order(draft()).await.is_err());
        assert!(backend.orders().is_empty());

        assert!(backend.create_order(draft()).await.is_ok());
        assert_eq!(backend.orders().len(), 1);
    }

    #[test]
    fn test_draft_wire_format_matches_backend_collection() {
        let json = serde_json::to_value(draft()).unwrap();
        assert_eq!(json["userEmail"], "a@b.com");
        assert_eq!(json["total"], 11_980);
        assert_eq!(json["items"][0]["quantity"], 2);
    }
}
