use axum::{extract::Request, middleware::Next, response::IntoResponse, response::Response, Json};

use crate::response::ApiErrorResponse;

/// Attaches the request path to error envelopes.
///
/// [`crate::error::AppError::into_response`] stores the rendered
/// [`ApiErrorResponse`] in the response extensions; this layer rewrites the
/// body with `path` filled in from the request URI.
pub async fn error_path_middleware(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    if let Some(body) = response.extensions().get::<ApiErrorResponse>() {
        let mut body = body.clone();
        body.path = Some(path);
        let status = response.status();
        return (status, Json(body)).into_response();
    }

    response
}
