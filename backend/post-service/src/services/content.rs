/// Content resolution - turns raw request fields into typed post content
use crate::error::{AppError, Result};
use crate::models::{ContentPayload, ImageUpload, PostContent, PostType};
use crate::storage::FileStorage;
use std::sync::Arc;
use url::Url;

const ACCEPTED_IMAGE_SUBTYPES: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

/// Resolves the content of a post for its declared type.
///
/// Image resolution writes the uploaded file to storage. That write is the
/// last step: every check runs first, so a rejected request never leaves
/// a file behind.
#[derive(Clone)]
pub struct ContentResolver {
    storage: Arc<dyn FileStorage>,
    max_image_bytes: usize,
}

impl ContentResolver {
    pub fn new(storage: Arc<dyn FileStorage>, max_image_bytes: usize) -> Self {
        Self {
            storage,
            max_image_bytes,
        }
    }

    pub fn storage(&self) -> &Arc<dyn FileStorage> {
        &self.storage
    }

    pub async fn resolve(&self, post_type: PostType, payload: ContentPayload) -> Result<PostContent> {
        if post_type != PostType::Image && !payload.images.is_empty() {
            return Err(AppError::Validation(format!(
                "A {} post cannot carry an image attachment",
                post_type
            )));
        }

        match post_type {
            PostType::Text => resolve_text(payload.text),
            PostType::Link => resolve_link(payload.link_url),
            PostType::Image => self.resolve_image(payload.images).await,
        }
    }

    async fn resolve_image(&self, mut images: Vec<ImageUpload>) -> Result<PostContent> {
        if images.len() != 1 {
            return Err(AppError::Validation(format!(
                "An image post requires exactly one image file, got {}",
                images.len()
            )));
        }
        let image = images.remove(0);

        let content_type = accepted_image_type(&image.content_type)?;
        if image.bytes.is_empty() {
            return Err(AppError::Validation("Image file is empty".to_string()));
        }
        if image.bytes.len() > self.max_image_bytes {
            return Err(AppError::Validation(format!(
                "Image exceeds the {} byte limit",
                self.max_image_bytes
            )));
        }

        let file = self.storage.store(&image.bytes, &content_type).await?;
        Ok(PostContent::Image { file })
    }
}

fn resolve_text(text: Option<String>) -> Result<PostContent> {
    match text {
        Some(body) if !body.trim().is_empty() => Ok(PostContent::Text { body }),
        _ => Err(AppError::Validation(
            "A text post requires non-empty text".to_string(),
        )),
    }
}

fn resolve_link(link_url: Option<String>) -> Result<PostContent> {
    let raw = link_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::Validation("A link post requires linkUrl".to_string()))?;

    let url = Url::parse(raw.trim())
        .map_err(|e| AppError::Validation(format!("linkUrl is not a valid URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::Validation(
            "linkUrl must be an absolute http(s) URL".to_string(),
        ));
    }

    Ok(PostContent::Link {
        url: url.to_string(),
    })
}

fn accepted_image_type(content_type: &str) -> Result<mime::Mime> {
    let parsed: mime::Mime = content_type
        .parse()
        .map_err(|_| AppError::Validation(format!("Unrecognized content type '{}'", content_type)))?;

    if parsed.type_() == mime::IMAGE
        && ACCEPTED_IMAGE_SUBTYPES.contains(&parsed.subtype().as_str())
    {
        Ok(parsed)
    } else {
        Err(AppError::Validation(format!(
            "Unsupported image format '{}'. Accepted: jpeg, png, gif, webp",
            content_type
        )))
    }
}
