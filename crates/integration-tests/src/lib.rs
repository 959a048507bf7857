//! Integration tests for La Botillería.
//!
//! The tests drive the full session core - catalog, cart, auth session, and
//! checkout - through [`AppState`] against in-memory collaborators, the same
//! wiring the presentation layer uses in production minus the real remote
//! backends.
//!
//! # Test Categories
//!
//! - `checkout_flow` - Catalog → cart → auth → order submission
//! - `session_persistence` - Envelope round-trips, migration, restart behavior

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use botilleria_core::{Price, ProductId};
use botilleria_storefront::cart::NewCartItem;
use botilleria_storefront::catalog::{Catalog, Product};
use botilleria_storefront::config::{BackendConfig, StorefrontConfig};
use botilleria_storefront::orders::{InMemoryOrderBackend, OrderBackend};
use botilleria_storefront::services::auth::{ScriptedAuthBackend, SessionEvent};
use botilleria_storefront::session::persist::SessionStorage;
use botilleria_storefront::session::UserSession;
use botilleria_storefront::state::AppState;

/// A fully wired application over in-memory collaborators.
pub struct TestContext {
    pub state: AppState,
    pub orders: Arc<InMemoryOrderBackend>,
    /// Handle playing the remote identity provider.
    pub session_events: mpsc::UnboundedSender<SessionEvent>,
    /// The session event listener spawned by `AppState::start`.
    pub listener: JoinHandle<()>,
}

impl TestContext {
    /// Build and start an application over the given session storage.
    pub async fn with_storage(storage: Arc<dyn SessionStorage>) -> Self {
        init_test_logging();

        let (auth_backend, session_events) = ScriptedAuthBackend::new();
        let orders = Arc::new(InMemoryOrderBackend::new());

        let state = AppState::new(
            test_config(),
            sample_catalog(),
            storage,
            Arc::new(auth_backend),
            Arc::clone(&orders) as Arc<dyn OrderBackend>,
        );
        let listener = state.start().await;

        Self {
            state,
            orders,
            session_events,
            listener,
        }
    }

    /// Build and start an application with empty in-memory session storage.
    pub async fn new() -> Self {
        use botilleria_storefront::session::persist::InMemorySessionStorage;
        Self::with_storage(Arc::new(InMemorySessionStorage::new())).await
    }

    /// Push an identity event and wait until the store has applied it.
    ///
    /// # Panics
    ///
    /// Panics if the event channel or the store subscription is closed.
    pub async fn push_session_event(&self, event: SessionEvent) {
        let expect_authenticated = matches!(
            &event,
            Some(user) if user.email.is_some()
        );

        let mut rx = self.state.auth().subscribe();
        self.session_events
            .send(event)
            .expect("session event channel closed");

        rx.wait_for(|state| {
            state.is_auth_initialized && state.is_authenticated == expect_authenticated
        })
        .await
        .expect("auth store subscription closed");
    }

    /// Sign the visitor in as `email` and wait for the store to settle.
    pub async fn sign_in(&self, email: &str) {
        self.push_session_event(Some(UserSession {
            email: Some(email.to_owned()),
            display_name: Some("Cliente de Prueba".to_owned()),
            photo_url: None,
        }))
        .await;
    }

    /// Add `quantity` units of a catalog product to the cart, the way the
    /// product card does: one `add_item` call per unit.
    ///
    /// # Panics
    ///
    /// Panics if the product is not in the catalog.
    pub fn add_to_cart(&self, id: &str, quantity: u32) {
        let product_id = ProductId::new(id);
        let product = self
            .state
            .catalog()
            .get(&product_id)
            .expect("product not in catalog")
            .clone();

        for _ in 0..quantity {
            self.state.cart().add_item(NewCartItem {
                id: product.id.clone(),
                name: product.name.clone(),
                price: product.price,
                image: product.image.clone(),
            });
        }
    }
}

/// Configuration for tests; nothing in it reaches a real backend.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        session_file: PathBuf::from("auth-storage.json"),
        catalog_file: None,
        backend: BackendConfig {
            project: "botilleria-test".to_owned(),
            api_key: SecretString::from("test-api-key"),
        },
    }
}

/// A small catalog covering every category the tests filter on.
///
/// # Panics
///
/// Panics if the sample data is internally inconsistent.
#[must_use]
pub fn sample_catalog() -> Catalog {
    let product = |id: &str, name: &str, price: i64, description: &str, category: &str| Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        price: Price::new(price),
        image: Url::parse(&format!("https://images.example.com/{id}.jpg"))
            .expect("valid image url"),
        description: description.to_owned(),
        rating: 4.5,
        category: category.to_owned(),
    };

    Catalog::from_products(vec![
        product(
            "vino-carmenere",
            "Vino Tinto Carmenere Reserva",
            6990,
            "Carmenere del valle de Colchagua, cuerpo medio",
            "vinos",
        ),
        product(
            "vino-sauvignon",
            "Vino Blanco Sauvignon Blanc",
            5490,
            "Fresco y cítrico, valle de Casablanca",
            "vinos",
        ),
        product(
            "cerveza-stout",
            "Cerveza Artesanal Stout",
            2990,
            "Notas a café y chocolate",
            "cervezas",
        ),
        product(
            "pisco-reservado",
            "Pisco Reservado 40°",
            8990,
            "Doble destilado del valle del Elqui",
            "piscos",
        ),
    ])
    .expect("sample catalog is valid")
}

fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "botilleria=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
