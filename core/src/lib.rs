//! Synchronous data-sync core for the e-commerce back-office admin.
//!
//! # Overview
//! Every call to the admin REST API goes through one `ApiClient`, which
//! builds an `HttpRequest`, hands it to a `Transport` and turns the
//! `HttpResponse` into a JSON payload or a structured `ApiError`. Resource
//! modules shape payloads per resource, state containers hold what the admin
//! views render, and `SessionGuard` gates protected views on the session.
//!
//! # Design
//! - Request building and response parsing are pure; only the transport
//!   performs I/O, so tests script responses with `testing::ScriptedTransport`
//!   (built for unit tests and behind the `testing` feature).
//! - The session token lives in a `SessionContext` injected into the client.
//!   A 401 on an authenticated call evicts it once and notifies observers.
//! - Stores fence overlapping fetches with a generation counter so a stale
//!   response never overwrites a newer one.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod resources;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, ErrorKind, HttpError, StoreError};
pub use guard::{GuardDecision, GuardState, LoginRedirect, SessionGuard};
pub use http::{FileUpload, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
pub use resources::{Page, PageQuery, Pagination};
pub use session::{FileTokenStore, MemoryTokenStore, SessionContext, SessionObserver, TokenStore};
pub use store::{
    AuthStore, BlogStore, CategoryStore, Collection, DiscountStore, ManufacturerStore, OrderStore, Phase, ProductStore,
};
pub use transport::{Transport, TransportError, UreqTransport};
