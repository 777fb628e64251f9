/// Request body parsing shared by the create and edit endpoints.
///
/// Both endpoints accept either a JSON body or `multipart/form-data`.
/// Image files can only arrive through multipart.
use crate::error::{AppError, Result};
use crate::models::{ContentPayload, ImageUpload};
use actix_multipart::{Field, Multipart};
use actix_web::http::header::{self, ContentDisposition};
use actix_web::{web, HttpRequest};
use futures_util::StreamExt;
use serde::Deserialize;

/// Largest JSON body or multipart text field accepted.
const MAX_TEXT_BYTES: usize = 64 * 1024;

/// Fields of a create/edit request before any validation.
#[derive(Debug, Default)]
pub struct PostForm {
    pub post_type: Option<String>,
    pub title: Option<String>,
    pub content: ContentPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonPostBody {
    #[serde(rename = "type")]
    post_type: Option<String>,
    title: Option<String>,
    text: Option<String>,
    link_url: Option<String>,
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Reads the request body as JSON or multipart depending on its content type.
pub async fn read_post_form(
    req: &HttpRequest,
    payload: web::Payload,
    max_image_bytes: usize,
) -> Result<PostForm> {
    if is_multipart(req) {
        read_multipart(Multipart::new(req.headers(), payload), max_image_bytes).await
    } else {
        read_json(payload).await
    }
}

async fn read_json(mut payload: web::Payload) -> Result<PostForm> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|e| AppError::Validation(format!("Failed to read body: {}", e)))?;
        if body.len() + chunk.len() > MAX_TEXT_BYTES {
            return Err(AppError::Validation("Request body too large".to_string()));
        }
        body.extend_from_slice(&chunk);
    }

    let parsed: JsonPostBody = if body.is_empty() {
        JsonPostBody::default()
    } else {
        serde_json::from_slice(&body)?
    };

    Ok(PostForm {
        post_type: parsed.post_type,
        title: parsed.title,
        content: ContentPayload {
            text: parsed.text,
            link_url: parsed.link_url,
            images: Vec::new(),
        },
    })
}

async fn read_multipart(mut multipart: Multipart, max_image_bytes: usize) -> Result<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next().await {
        let mut field =
            field.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;

        let disposition = field
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| ContentDisposition::from_raw(value).ok());
        let name = disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        match name.as_str() {
            "image" => {
                if !form.content.images.is_empty() {
                    return Err(AppError::Validation(
                        "Only one image file may be uploaded per post".to_string(),
                    ));
                }
                let file_name = disposition
                    .as_ref()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string);
                let content_type = field
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = read_field(&mut field, max_image_bytes, "image").await?;

                form.content.images.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "title" => form.title = Some(read_text_field(&mut field, "title").await?),
            "text" => form.content.text = Some(read_text_field(&mut field, "text").await?),
            "linkUrl" => form.content.link_url = Some(read_text_field(&mut field, "linkUrl").await?),
            "type" => form.post_type = Some(read_text_field(&mut field, "type").await?),
            _ => {
                // Unknown fields are drained and ignored.
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;
                }
            }
        }
    }

    Ok(form)
}

async fn read_field(field: &mut Field, limit: usize, name: &str) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk
            .map_err(|e| AppError::Validation(format!("Failed to read field {}: {}", name, e)))?;
        if data.len() + chunk.len() > limit {
            return Err(AppError::Validation(format!(
                "Field {} exceeds the {} byte limit",
                name, limit
            )));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_text_field(field: &mut Field, name: &str) -> Result<String> {
    let bytes = read_field(field, MAX_TEXT_BYTES, name).await?;
    String::from_utf8(bytes)
        .map_err(|_| AppError::Validation(format!("Field {} is not valid UTF-8", name)))
}
