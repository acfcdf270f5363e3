//! Identity provider adapter
//!
//! The only part of the application that talks to the managed identity
//! service. Everything above this module sees [`IdentityProvider`],
//! [`IdentityError`] and the data model types.

pub mod cognito;
pub mod errors;
pub mod provider;
pub mod sigv4;

pub use cognito::CognitoClient;
pub use errors::IdentityError;
pub use provider::IdentityProvider;
