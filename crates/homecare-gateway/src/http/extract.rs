//! Extractor wrappers whose rejections render as [`ServiceError`] bodies,
//! so malformed requests carry the same `{error, code}` shape as every
//! other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ServiceError;

/// JSON request body. Type mismatches (`"age": "seventy"`) become 422
/// `VALIDATION_ERROR`; syntax errors and a missing content type become 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct JsonBody<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServiceError))]
pub struct QueryParams<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServiceError))]
pub struct PathParam<T>(pub T);
