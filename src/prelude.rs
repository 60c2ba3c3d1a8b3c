//! Prelude module for convenient imports.
//!
//! ```rust
//! use infisical_client::prelude::*;
//! ```

// Core types
pub use crate::Error;
pub use crate::ErrorCategory;
pub use crate::Result;

// Authentication
pub use crate::auth::{
    AuthMode, Credential, CredentialState, LoginDescriptor, LoginParams, LoginResponse,
    ResourceCategory,
};

// Client
pub use crate::client::{
    ApiError, ApiErrorKind, Client, ClientBuilder, ClientConfig, Query, RequestDispatcher,
    RequestOptions,
};
