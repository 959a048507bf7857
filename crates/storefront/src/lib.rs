//! La Botillería storefront - client-side commerce session core.
//!
//! This crate holds the state machines and workflows behind the shop UI:
//! the product catalog and its filter engine, the reactive cart store, the
//! persisted and schema-versioned auth session, and the order submission
//! workflow that bridges local state to the remote system of record.
//!
//! Rendering, routing, theming, the catalog dataset, and the payment gateway
//! are external collaborators; they reach the core only through the
//! contracts in [`orders`], [`services::auth`], and [`session::persist`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod orders;
pub mod services;
pub mod session;
pub mod state;
