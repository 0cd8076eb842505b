//! Registry module for remote image registry interactions
//!
//! Provider matching ([`RegistryMatcher`]), bearer challenge/token exchange
//! ([`Auth`], [`TokenManager`]) and the signed HTTP client ([`RegistryClient`])
//! built on top of them.

pub mod auth;
pub mod client;
pub mod matcher;
pub mod token_manager;

pub use auth::{Auth, AuthContext, TokenInfo, parse_www_authenticate};
pub use client::{RegistryClient, RegistryClientBuilder};
pub use matcher::{ImageRegistry, RegistryMatcher};
pub use token_manager::{RequestSigner, TokenManager};
