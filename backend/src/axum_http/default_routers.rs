use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::axum_http::error_responses::error_response;

pub async fn not_found() -> Response {
    info!("backend router: no route matched");
    error_response(StatusCode::NOT_FOUND, "route not found")
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn unknown_routes_use_the_error_body_shape() {
        let response = not_found().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 404);
        assert_eq!(body["message"], "route not found");
    }
}
