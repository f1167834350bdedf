use crate::AppState;
use crate::api::error::AppError;
use axum::{
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};

/// Rejects requests whose declared length exceeds the upload limit before
/// any handler runs. Bodies without a length are capped by `DefaultBodyLimit`.
pub async fn body_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(length) = declared
        && length > state.config.max_upload_size
    {
        tracing::warn!(
            "Rejecting {} {}: body of {} bytes exceeds limit of {} bytes",
            req.method(),
            req.uri(),
            length,
            state.config.max_upload_size
        );
        return Err(AppError::PayloadTooLarge);
    }

    Ok(next.run(req).await)
}
