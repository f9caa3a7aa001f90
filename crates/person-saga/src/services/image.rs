//! Image service trait and in-memory implementation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::SagaError;
use crate::model::Thumbnails;

/// Operations the orchestrator needs from the image service.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Derives a color and a sepia thumbnail from raw image bytes.
    async fn create_thumbnails(&self, image: &[u8]) -> Result<Thumbnails, SagaError>;

    /// Deletes an image. Deleting an image that does not exist is not an error.
    async fn delete(&self, reference: &str) -> Result<(), SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryImageState {
    images: HashSet<String>,
    deleted: Vec<String>,
    next_id: u32,
    create_calls: usize,
    delete_calls: usize,
    fail_on_create: bool,
    fail_on_delete: bool,
}

/// In-memory image service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryImageService {
    state: Arc<Mutex<InMemoryImageState>>,
}

impl InMemoryImageService {
    /// Creates a new in-memory image service.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryImageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configures the service to fail every create_thumbnails call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state().fail_on_create = fail;
    }

    /// Configures the service to fail every delete call.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.state().fail_on_delete = fail;
    }

    /// Returns the number of stored images.
    pub fn image_count(&self) -> usize {
        self.state().images.len()
    }

    /// Returns true if an image exists with the given reference.
    pub fn has_image(&self, reference: &str) -> bool {
        self.state().images.contains(reference)
    }

    /// Returns how many times create_thumbnails was called.
    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    /// Returns how many times delete was called.
    pub fn delete_calls(&self) -> usize {
        self.state().delete_calls
    }

    /// Returns the references passed to successful delete calls, in order.
    pub fn deleted(&self) -> Vec<String> {
        self.state().deleted.clone()
    }
}

#[async_trait]
impl ImageService for InMemoryImageService {
    async fn create_thumbnails(&self, image: &[u8]) -> Result<Thumbnails, SagaError> {
        let mut state = self.state();
        state.create_calls += 1;

        if state.fail_on_create {
            return Err(SagaError::ImageService(
                "Transformation failed".to_string(),
            ));
        }
        if image.is_empty() {
            return Err(SagaError::ImageService("Empty image".to_string()));
        }

        state.next_id += 1;
        let thumbnails = Thumbnails::new(
            format!("THUMB-{:04}", state.next_id),
            format!("SEPIA-{:04}", state.next_id),
        );
        for reference in thumbnails.refs() {
            state.images.insert(reference.to_string());
        }

        Ok(thumbnails)
    }

    async fn delete(&self, reference: &str) -> Result<(), SagaError> {
        let mut state = self.state();
        state.delete_calls += 1;

        if state.fail_on_delete {
            return Err(SagaError::ImageService(
                "Image service unavailable".to_string(),
            ));
        }

        state.images.remove(reference);
        state.deleted.push(reference.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_delete_thumbnails() {
        let service = InMemoryImageService::new();

        let thumbnails = service.create_thumbnails(b"raw").await.unwrap();
        assert_eq!(service.image_count(), 2);
        assert!(service.has_image(&thumbnails.color));
        assert!(service.has_image(&thumbnails.sepia));

        service.delete(&thumbnails.color).await.unwrap();
        service.delete(&thumbnails.sepia).await.unwrap();
        assert_eq!(service.image_count(), 0);
        assert_eq!(service.deleted(), vec![thumbnails.color, thumbnails.sepia]);
    }

    #[tokio::test]
    async fn test_delete_missing_image_is_ok() {
        let service = InMemoryImageService::new();
        assert!(service.delete("THUMB-9999").await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_on_create() {
        let service = InMemoryImageService::new();
        service.set_fail_on_create(true);

        let result = service.create_thumbnails(b"raw").await;
        assert!(matches!(result, Err(SagaError::ImageService(_))));
        assert_eq!(service.image_count(), 0);
        assert_eq!(service.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_fail_on_delete_keeps_image() {
        let service = InMemoryImageService::new();
        let thumbnails = service.create_thumbnails(b"raw").await.unwrap();
        service.set_fail_on_delete(true);

        assert!(service.delete(&thumbnails.color).await.is_err());
        assert!(service.has_image(&thumbnails.color));
    }

    #[tokio::test]
    async fn test_sequential_references() {
        let service = InMemoryImageService::new();

        let t1 = service.create_thumbnails(b"one").await.unwrap();
        let t2 = service.create_thumbnails(b"two").await.unwrap();

        assert_eq!(t1, Thumbnails::new("THUMB-0001", "SEPIA-0001"));
        assert_eq!(t2, Thumbnails::new("THUMB-0002", "SEPIA-0002"));
    }
}
