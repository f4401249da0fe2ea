use axum::http::HeaderMap;
use bytes::Bytes;

use super::ALLOWED_CONTENT_TYPES;

pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Pull the `file` field out of a multipart body and check it is an image.
pub async fn parse_image(headers: &HeaderMap, body: Bytes) -> Result<ImageUpload, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err("Only image files are allowed".to_string());
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        if bytes.is_empty() {
            return Err("File is required".to_string());
        }
        return Ok(ImageUpload {
            content_type,
            bytes,
        });
    }

    Err("File is required".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn body(field: &str, content_type: &str, data: &str) -> (HeaderMap, Bytes) {
        let boundary = "XBOUNDARYX";
        let raw = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"a.bin\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             {data}\r\n\
             --{boundary}--\r\n"
        );
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_str(&format!("multipart/form-data; boundary={boundary}")).unwrap(),
        );
        (headers, Bytes::from(raw))
    }

    #[tokio::test]
    async fn accepts_png() {
        let (headers, raw) = body("file", "image/png", "pngdata");
        let upload = parse_image(&headers, raw).await.unwrap();
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(&upload.bytes[..], b"pngdata");
    }

    #[tokio::test]
    async fn rejects_non_images() {
        let (headers, raw) = body("file", "application/pdf", "%PDF");
        let err = parse_image(&headers, raw).await.unwrap_err();
        assert_eq!(err, "Only image files are allowed");
    }

    #[tokio::test]
    async fn requires_the_file_field() {
        let (headers, raw) = body("avatar", "image/png", "pngdata");
        let err = parse_image(&headers, raw).await.unwrap_err();
        assert_eq!(err, "File is required");
    }

    #[tokio::test]
    async fn requires_boundary() {
        let err = parse_image(&HeaderMap::new(), Bytes::new()).await.unwrap_err();
        assert_eq!(err, "Missing multipart boundary");
    }
}
