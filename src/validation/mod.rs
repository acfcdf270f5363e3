//! Request body validation
//!
//! [`ValidatedJson`] replaces `web::Json` on every route that takes a body.
//! It deserializes the payload and then runs the model's [`Validate`] impl;
//! both kinds of failure become a 422 before the handler body runs, so a
//! rejected request never reaches the identity provider.

pub mod core;

use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use serde::de::DeserializeOwned;

use crate::utils::ApiError;

pub use self::core::{require_email, require_non_empty};

/// Field-level checks run after a request body deserializes
pub trait Validate {
    /// # Errors
    ///
    /// Returns a human-readable description of every failed check.
    fn validate(&self) -> Result<(), String>;
}

/// JSON body that has been deserialized and validated
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
{
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        Box::pin(validated(web::Json::<T>::from_request(req, payload)))
    }
}

async fn validated<T: Validate>(
    json: <web::Json<T> as FromRequest>::Future,
) -> Result<ValidatedJson<T>, ApiError>
where
    T: DeserializeOwned,
{
    let body = json.await.map_err(|e| {
        log::debug!("Rejected request body: {e}");
        ApiError::Validation(e.to_string())
    })?;
    body.validate().map_err(ApiError::Validation)?;
    Ok(ValidatedJson(body.into_inner()))
}
