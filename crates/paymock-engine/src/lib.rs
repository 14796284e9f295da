//! In-memory engine of the paymock payment API mock.
//!
//! The engine stands in for a remote payment service during tests: client
//! code creates, retrieves and updates resources as it would against the
//! real API and gets back faithful objects and errors.
//!
//! ## Layout
//!
//! - [`registry`]: typed, insertion-ordered tables with atomic multi-table
//!   transactions
//! - [`validation`]: per-operation parameter rules, first violation wins
//! - [`expand`]: read-time reference expansion with a cycle guard
//! - [`engine`]: [`MockEngine`], every operation and transition
//! - [`dispatch`]: JSON entry point for transport shims
//! - [`settings`]: engine configuration, loadable from TOML
//!
//! ## Example
//!
//! ```
//! use paymock_engine::MockEngine;
//! use paymock_types::params::{CreateCheckoutSession, LineItemParams};
//! use paymock_types::PaymentIntent;
//!
//! let engine = MockEngine::new();
//! let session = engine
//!     .create_checkout_session(CreateCheckoutSession {
//!         success_url: Some("https://example.com/success".to_string()),
//!         line_items: Some(vec![LineItemParams {
//!             name: Some("T-shirt".to_string()),
//!             amount: Some(500),
//!             currency: Some("usd".to_string()),
//!             quantity: Some(2),
//!             ..Default::default()
//!         }]),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let session = engine
//!     .retrieve_checkout_session(&session.id, &["payment_intent"])
//!     .unwrap();
//! let intent: PaymentIntent = session.payment_intent.unwrap().into_object().unwrap();
//! assert_eq!(intent.amount, 1000);
//! ```

#![warn(missing_docs)]

pub mod dispatch;
pub mod engine;
pub mod expand;
pub mod registry;
pub mod settings;
pub mod validation;

pub use dispatch::{Operation, dispatch};
pub use engine::{Completion, MockEngine};
pub use expand::Expand;
pub use registry::{Registry, Stored};
pub use settings::{EngineSettings, ExpansionPolicy, SettingsError};
