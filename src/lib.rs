#![doc = include_str!("../README.md")]

pub mod cli;
pub mod error;
pub mod middleware;
pub mod oauth;
pub mod pkce;
pub mod server;
pub mod types;

// Re-exports for convenient access
pub use error::Error;
pub use oauth::{AuthClient, AuthorizationRequest, Identity, OAuthConfig, TokenResponse};
pub use pkce::{generate_code_challenge, generate_code_verifier, generate_nonce, generate_state};
pub use types::{Claims, OpenRedirectRejected, ReturnTo, SessionId, Subject};
