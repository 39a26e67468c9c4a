//! sweet_shop: client core for a small sweets-inventory storefront
//!
//! Auth gateway with remote-then-local fallback, persisted session state,
//! route guard, and the catalog/purchase logic behind the storefront and
//! admin-panel surfaces.
//! - Remote: reqwest JSON client for the REST collaborator
//! - Local: in-memory credential store, unsigned token issuer, Sled-backed
//!   session, catalog and purchase ledger

pub mod models;
pub mod errors;
pub mod config;
pub mod storage;
pub mod session;
pub mod credentials;
pub mod token;
// Remote collaborator client and the fallback policy wrapping every call
pub mod remote;
pub mod fallback;
pub mod gateway;
pub mod guard;
pub mod catalog;
pub mod validation;
// Wiring shared by the binaries
pub mod app;
pub mod logging;
