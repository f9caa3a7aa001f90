//! Image service client.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use uuid::Uuid;

use super::normalize_base_url;
use crate::error::SagaError;
use crate::model::Thumbnails;
use crate::services::ImageService;

/// Label of the color thumbnail in the transformation request and response.
pub const COLOR_THUMBNAIL_LABEL: &str = "thumbnail";

/// Label of the sepia thumbnail in the transformation request and response.
pub const SEPIA_THUMBNAIL_LABEL: &str = "sepia";

const THUMBNAIL_SIZE: &str = "300";

/// One image produced by the transform endpoint.
#[derive(Debug, Clone, Deserialize)]
struct TransformedImage {
    label: String,
    name: String,
}

/// [`ImageService`] backed by the image microservice's REST API.
#[derive(Debug, Clone)]
pub struct HttpImageService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpImageService {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}api/{path}", self.base_url)
    }
}

/// Transformation definitions for the color and sepia thumbnails.
fn transformation_definitions() -> serde_json::Value {
    let resize = serde_json::json!({
        "name": "resize",
        "width": THUMBNAIL_SIZE,
        "height": THUMBNAIL_SIZE,
        "crop": true
    });
    serde_json::json!([
        { "label": COLOR_THUMBNAIL_LABEL, "transformations": [resize.clone()] },
        { "label": SEPIA_THUMBNAIL_LABEL, "transformations": [resize, { "name": "sepia" }] }
    ])
}

fn find_label(images: &[TransformedImage], label: &str) -> Result<String, SagaError> {
    images
        .iter()
        .find(|image| image.label == label)
        .map(|image| image.name.clone())
        .ok_or_else(|| {
            SagaError::ImageService(format!("transform response has no '{label}' image"))
        })
}

fn parse_thumbnails(images: &[TransformedImage]) -> Result<Thumbnails, SagaError> {
    Ok(Thumbnails::new(
        find_label(images, COLOR_THUMBNAIL_LABEL)?,
        find_label(images, SEPIA_THUMBNAIL_LABEL)?,
    ))
}

fn request_error(e: reqwest::Error) -> SagaError {
    SagaError::ImageService(e.to_string())
}

#[async_trait]
impl ImageService for HttpImageService {
    async fn create_thumbnails(&self, image: &[u8]) -> Result<Thumbnails, SagaError> {
        let url = self.url("transform/");
        tracing::info!(%url, "creating thumbnails");

        let form = Form::new()
            .part(
                "image",
                Part::bytes(image.to_vec()).file_name(Uuid::new_v4().to_string()),
            )
            .text(
                "transformationDefinitions",
                transformation_definitions().to_string(),
            );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SagaError::ImageService(format!(
                "transform failed ({status}): {body}"
            )));
        }

        let images: Vec<TransformedImage> = response.json().await.map_err(request_error)?;
        parse_thumbnails(&images)
    }

    async fn delete(&self, reference: &str) -> Result<(), SagaError> {
        let url = self.url(&format!("remove/{reference}"));
        tracing::info!(%url, "deleting image");

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::warn!(
                    reference,
                    "image service returned 404, image might already have been deleted"
                );
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(SagaError::ImageService(format!(
                    "delete of {reference} failed ({status}): {body}"
                )))
            }
        }
    }
}
