//! Order submission workflow.
//!
//! Bridges the local cart and session stores to the remote order backend.
//! The submission is all-or-nothing from the caller's point of view: either
//! the order exists in the backend and the cart is cleared, or nothing
//! changed and the visitor may retry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{error, info, instrument};

use botilleria_core::OrderId;

use crate::cart::CartStore;
use crate::orders::{OrderBackend, OrderBackendError, OrderDraft, OrderLine};
use crate::session::AuthStore;

/// Confirmation shown to the visitor after a successful checkout.
pub const CHECKOUT_SUCCESS_MESSAGE: &str =
    "¡Gracias por tu compra! Tu pedido ha sido procesado exitosamente.";

/// Checkout failure. Local state is untouched when this is returned.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("order submission failed: {0}")]
    Backend(#[from] OrderBackendError),
}

/// The result of a checkout trigger that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Visitor is not signed in; present the login flow. Nothing was
    /// submitted.
    RedirectToLogin,
    /// The cart is empty; nothing to submit.
    EmptyCart,
    /// A submission is already in flight; this trigger was ignored.
    AlreadyInFlight,
    /// The order was created and the cart cleared.
    Completed {
        order_id: OrderId,
        message: String,
    },
}

/// Orchestrates checkout over the cart store, the auth store, and the order
/// backend. At most one submission is in flight per cart.
pub struct CheckoutFlow {
    cart: Arc<CartStore>,
    auth: Arc<AuthStore>,
    backend: Arc<dyn OrderBackend>,
    in_flight: AtomicBool,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new(cart: Arc<CartStore>, auth: Arc<AuthStore>, backend: Arc<dyn OrderBackend>) -> Self {
        Self {
            cart,
            auth,
            backend,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently in flight (e.g. to disable the
    /// checkout trigger in the presentation layer).
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit the current cart as an order.
    ///
    /// Items, total, and the visitor's email are snapshotted at call time;
    /// cart mutations made while the submission is pending do not affect it.
    /// On success the cart is cleared. On failure the cart and session are
    /// left untouched and the guard is released so the visitor can retry.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Backend` when the remote call fails.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<CheckoutOutcome, CheckoutError> {
        let session = self.auth.snapshot();
        if !session.is_authenticated {
            info!("checkout attempted while signed out, redirecting to login");
            return Ok(CheckoutOutcome::RedirectToLogin);
        }

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Ok(CheckoutOutcome::EmptyCart);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(CheckoutOutcome::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let draft = OrderDraft {
            items: cart
                .items()
                .iter()
                .map(|item| OrderLine {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
            total: cart.total(),
            user_email: session
                .user
                .and_then(|user| user.email)
                .unwrap_or_default(),
        };

        let order_id = self.backend.create_order(draft).await.map_err(|e| {
            error!(error = %e, "order submission failed");
            e
        })?;

        self.cart.clear();
        info!(order_id = %order_id, "order submitted");

        Ok(CheckoutOutcome::Completed {
            order_id,
            message: CHECKOUT_SUCCESS_MESSAGE.to_owned(),
        })
    }
}

/// Releases the single-flight guard on every exit path, including errors.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::NewCartItem;
    use crate::orders::InMemoryOrderBackend;
    use crate::session::persist::InMemorySessionStorage;
    use crate::session::UserSession;
    use botilleria_core::{Price, ProductId};
    use url::Url;

    struct Fixture {
        cart: Arc<CartStore>,
        auth: Arc<AuthStore>,
        backend: Arc<InMemoryOrderBackend>,
        flow: CheckoutFlow,
    }

    fn fixture() -> Fixture {
        let cart = Arc::new(CartStore::new());
        let auth = Arc::new(AuthStore::load(Arc::new(InMemorySessionStorage::new())));
        let backend = Arc::new(InMemoryOrderBackend::new());
        let flow = CheckoutFlow::new(
            Arc::clone(&cart),
            Arc::clone(&auth),
            Arc::clone(&backend) as Arc<dyn OrderBackend>,
        );
        Fixture {
            cart,
            auth,
            backend,
            flow,
        }
    }

    fn sign_in(auth: &AuthStore, email: &str) {
        auth.set_user(Some(UserSession {
            email: Some(email.to_owned()),
            display_name: None,
            photo_url: None,
        }));
    }

    fn fill_cart(cart: &CartStore) {
        cart.add_item(NewCartItem {
            id: ProductId::new("vino-1"),
            name: "Vino Tinto Reserva".to_owned(),
            price: Price::new(5990),
            image: Url::parse("https://images.example.com/vino.jpg").unwrap(),
        });
        cart.add_item(NewCartItem {
            id: ProductId::new("vino-1"),
            name: "Vino Tinto Reserva".to_owned(),
            price: Price::new(5990),
            image: Url::parse("https://images.example.com/vino.jpg").unwrap(),
        });
    }

    #[tokio::test]
    async fn test_signed_out_checkout_redirects_without_backend_call() {
        let fx = fixture();
        fill_cart(&fx.cart);

        let outcome = fx.flow.submit().await.unwrap();
        assert_eq!(outcome, CheckoutOutcome::RedirectToLogin);
        assert!(fx.backend.orders().is_empty());
        assert_eq!(fx.cart.count(), 2);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_submits_nothing() {
        let fx = fixture();
        sign_in(&fx.auth, "a@b.com");

        let outcome = fx.flow.submit().await.unwrap();
        assert_eq!(outcome, CheckoutOutcome::EmptyCart);
        assert!(fx.backend.orders().is_empty());
    }

    #[tokio::test]
    async fn test_successful_checkout_clears_cart_and_carries_message() {
        let fx = fixture();
        sign_in(&fx.auth, "a@b.com");
        fill_cart(&fx.cart);

        let outcome = fx.flow.submit().await.unwrap();
        let CheckoutOutcome::Completed { order_id, message } = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(message, CHECKOUT_SUCCESS_MESSAGE);

        assert!(fx.cart.snapshot().is_empty());

        let orders = fx.backend.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order_id);
        assert_eq!(orders[0].user_email, "a@b.com");
        assert_eq!(orders[0].total, Price::new(11_980));
        assert_eq!(orders[0].items.len(), 1);
        assert_eq!(orders[0].items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_failed_checkout_leaves_cart_untouched_and_allows_retry() {
        let fx = fixture();
        sign_in(&fx.auth, "a@b.com");
        fill_cart(&fx.cart);
        fx.backend.fail_next();

        let err = fx.flow.submit().await;
        assert!(err.is_err());
        assert_eq!(fx.cart.count(), 2);
        assert!(fx.backend.orders().is_empty());
        assert!(!fx.flow.is_in_flight());

        // Retry succeeds with the same cart.
        let outcome = fx.flow.submit().await.unwrap();
        assert!(matches!(outcome, CheckoutOutcome::Completed { .. }));
        assert!(fx.cart.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_triggers_submit_exactly_one_order() {
        struct BlockingBackend {
            release: tokio::sync::Notify,
            inner: InMemoryOrderBackend,
        }

        #[async_trait::async_trait]
        impl OrderBackend for BlockingBackend {
            async fn create_order(
                &self,
                draft: OrderDraft,
            ) -> Result<OrderId, OrderBackendError> {
                self.release.notified().await;
                self.inner.create_order(draft).await
            }
        }

        let cart = Arc::new(CartStore::new());
        let auth = Arc::new(AuthStore::load(Arc::new(InMemorySessionStorage::new())));
        let backend = Arc::new(BlockingBackend {
            release: tokio::sync::Notify::new(),
            inner: InMemoryOrderBackend::new(),
        });
        let flow = Arc::new(CheckoutFlow::new(
            Arc::clone(&cart),
            Arc::clone(&auth),
            Arc::clone(&backend) as Arc<dyn OrderBackend>,
        ));

        sign_in(&auth, "a@b.com");
        fill_cart(&cart);

        let first = tokio::spawn({
            let flow = Arc::clone(&flow);
            async move { flow.submit().await }
        });

        // Wait until the first submission is parked inside the backend call.
        while !flow.is_in_flight() {
            tokio::task::yield_now().await;
        }

        let second = flow.submit().await.unwrap();
        assert_eq!(second, CheckoutOutcome::AlreadyInFlight);

        backend.release.notify_one();
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, CheckoutOutcome::Completed { .. }));
        assert_eq!(backend.inner.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_in_flight_submission_uses_call_time_snapshot() {
        struct CapturingBackend {
            release: tokio::sync::Notify,
            captured: std::sync::Mutex<Option<OrderDraft>>,
        }

        #[async_trait::async_trait]
        impl OrderBackend for CapturingBackend {
            async fn create_order(
                &self,
                draft: OrderDraft,
            ) -> Result<OrderId, OrderBackendError> {
                self.release.notified().await;
                if let Ok(mut slot) = self.captured.lock() {
                    *slot = Some(draft);
                }
                Ok(OrderId::new("captured"))
            }
        }

        let cart = Arc::new(CartStore::new());
        let auth = Arc::new(AuthStore::load(Arc::new(InMemorySessionStorage::new())));
        let backend = Arc::new(CapturingBackend {
            release: tokio::sync::Notify::new(),
            captured: std::sync::Mutex::new(None),
        });
        let flow = Arc::new(CheckoutFlow::new(
            Arc::clone(&cart),
            Arc::clone(&auth),
            Arc::clone(&backend) as Arc<dyn OrderBackend>,
        ));

        sign_in(&auth, "a@b.com");
        fill_cart(&cart);

        let submit = tokio::spawn({
            let flow = Arc::clone(&flow);
            async move { flow.submit().await }
        });
        while !flow.is_in_flight() {
            tokio::task::yield_now().await;
        }

        // Mutate the cart mid-flight; the draft must not change.
        cart.update_quantity(&ProductId::new("vino-1"), 9);

        backend.release.notify_one();
        submit.await.unwrap().unwrap();

        let draft = backend.captured.lock().unwrap().take().unwrap();
        assert_eq!(draft.items[0].quantity, 2);
        assert_eq!(draft.total, Price::new(11_980));
    }
}
