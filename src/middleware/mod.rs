//! Authentication front door for Axum.
//!
//! Every request passes the access guard: public paths go straight through,
//! protected pages without a session are redirected to the login entry point,
//! protected APIs answer 401, and retired endpoints answer 307 or 410.
//! Login runs an `OAuth2` authorization-code flow with PKCE against an
//! external identity provider and ends either in a session cookie or on the
//! `/auth-error` page, which never redirects.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use auth_frontdoor::middleware::{
//!     CurrentSession, FrontDoorConfig, MemoryPendingStore, MemorySessionStore, front_door,
//! };
//!
//! // 1. Configure from environment (missing IdP keys only disable login)
//! let config = FrontDoorConfig::from_env()?;
//!
//! // 2. Application routes; handlers behind the guard can extract the session
//! let app = axum::Router::new().route("/dashboard", get(dashboard));
//!
//! // 3. Wrap them with the front door
//! let router = front_door(
//!     config,
//!     Arc::new(MemoryPendingStore::new()),
//!     Arc::new(MemorySessionStore::new()),
//!     app,
//! );
//! ```

mod classify;
mod config;
mod cookies;
mod error;
mod extractor;
mod flow;
mod guard;
mod introspection;
mod memory;
mod pages;
mod routes;
mod state;
mod traits;
mod types;

pub use classify::{RouteClass, RouteTable, Surface};
pub use config::{FrontDoorConfig, MIN_SECRET_LEN};
pub use error::AuthError;
pub use extractor::{CurrentSession, resolve_session};
pub use flow::{AUTH_ERROR_PATH, CALLBACK_PATH, ErrorReason, FlowEvent, FlowState, LOGIN_PATH};
pub use introspection::RequiredConfig;
pub use memory::{
    DEFAULT_PENDING_CAPACITY, MIN_SWEEP_INTERVAL, MemoryPendingStore, MemorySessionStore,
    spawn_sweeper,
};
pub use routes::front_door;
pub use traits::{PendingRequestStore, SessionStore, StoreError};
pub use types::{NewSession, PendingAuthRequest, Session};

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
