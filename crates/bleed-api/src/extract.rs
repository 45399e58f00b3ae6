//! Extractors whose rejections render as [`ApiError`].
//!
//! Axum's stock `Json`, `Path`, and `Query` reject malformed input with
//! their own plain-text bodies (and `422` for JSON that fails to
//! deserialize). These wrappers route every rejection through
//! [`ApiError::BadRequest`] so clients always get the JSON error body and
//! a `400`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
