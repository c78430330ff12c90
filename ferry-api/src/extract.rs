use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejections go through [`AppError`], so a malformed or
/// mistyped body answers 400 with the usual `{"error": ...}` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
