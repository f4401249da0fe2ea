use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use serde::Serialize;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::state::SharedState;
use crate::uploads::StoredImage;
use crate::uploads::multipart;

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub image: StoredImage,
}

/// Store one image from the multipart `file` field.
pub async fn image(
    auth: AuthUser,
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let upload = multipart::parse_image(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;

    let image = state
        .images
        .store(&upload.content_type, &upload.bytes)
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(
        user_id = %auth.user_id,
        public_id = %image.public_id,
        bytes = upload.bytes.len(),
        "Image uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Image uploaded successfully".to_string(),
            image,
        }),
    ))
}
