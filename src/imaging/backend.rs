//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the crop pipeline
//! needs: identify (natural dimensions) and render (crop, resample, encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests substitute a recording mock.

use super::params::RenderParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid crop dimensions")]
    InvalidCrop,
    #[error("Image failed to load correctly: {0}")]
    ImageLoad(String),
    #[error("Failed to render the cropped image: {0}")]
    Draw(String),
    #[error("Failed to encode the cropped image: {0}")]
    Encode(String),
    #[error("Created file has zero size")]
    EmptyOutput,
    #[error("Rendering did not finish within {0:?}")]
    TimedOut(std::time::Duration),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Send + Sync` so a backend can be shared with the render worker thread.
pub trait ImageBackend: Send + Sync {
    /// Natural dimensions of an encoded image.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Crop `params.source` out of the decoded image, resample it onto the
    /// output surface and encode it. Returns the encoded bytes.
    fn render(&self, bytes: &[u8], params: &RenderParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{CropRect, Quality};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock backend that records operations without touching pixels.
    /// Uses Mutex (not RefCell) so it is Sync and can cross to the render worker.
    #[derive(Default)]
    pub struct MockBackend {
        pub dimensions: Mutex<Option<Dimensions>>,
        pub output: Mutex<Option<Vec<u8>>>,
        pub render_delay: Option<Duration>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(usize),
        Render {
            source: CropRect,
            output_width: u32,
            output_height: u32,
            media_type: String,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(width: u32, height: u32) -> Self {
            Self {
                dimensions: Mutex::new(Some(Dimensions { width, height })),
                output: Mutex::new(Some(vec![0xAB; 16])),
                ..Self::default()
            }
        }

        pub fn with_output(self, output: Vec<u8>) -> Self {
            *self.output.lock().unwrap() = Some(output);
            self
        }

        pub fn with_render_delay(mut self, delay: Duration) -> Self {
            self.render_delay = Some(delay);
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn render_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Render { .. }))
                .count()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(bytes.len()));

            let dims = *self.dimensions.lock().unwrap();
            dims.ok_or_else(|| BackendError::ImageLoad("No mock dimensions".to_string()))
        }

        fn render(&self, _bytes: &[u8], params: &RenderParams) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Render {
                source: params.source,
                output_width: params.output_width,
                output_height: params.output_height,
                media_type: params.media_type.clone(),
                quality: params.quality.value(),
            });
            if let Some(delay) = self.render_delay {
                std::thread::sleep(delay);
            }
            self.output
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| BackendError::Encode("No mock output".to_string()))
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(800, 600);

        let result = backend.identify(&[1, 2, 3]).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify(3)]);
    }

    #[test]
    fn mock_without_dimensions_fails_to_load() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.identify(&[]),
            Err(BackendError::ImageLoad(_))
        ));
    }

    #[test]
    fn mock_records_render() {
        let backend = MockBackend::with_dimensions(100, 100);

        let out = backend
            .render(
                &[],
                &RenderParams {
                    source: CropRect::new(0.0, 0.0, 50.0, 50.0),
                    output_width: 100,
                    output_height: 100,
                    media_type: "image/png".into(),
                    quality: Quality::MAX,
                },
            )
            .unwrap();
        assert!(!out.is_empty());

        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Render {
                output_width: 100,
                output_height: 100,
                quality: 100,
                ..
            }
        ));
    }
}
