//! Service layer bridging external collaborators into the local stores.

pub mod auth;
