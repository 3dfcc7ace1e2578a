//! Local resolution pipeline: image preprocessing plus on-device OCR.
//!
//! Fallback strategy for printed numeric/alphanumeric codes with no network
//! dependency. The raster is binarized and eroded to strip background noise
//! before recognition. Unlike the remote solver, this path does not
//! normalize failures: any decode, transform or recognition fault
//! propagates to the caller as an `Err`.

use crate::error::{CaptextError, Result};
use crate::recognize::TextRecognizer;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, GrayImage, ImageFormat};
use imageproc::contrast::{threshold, ThresholdType};
use std::io::Cursor;
use std::sync::Arc;

/// Luminance cutoff separating ink from background (of 255).
const BINARY_THRESHOLD: u8 = 150;

/// Side length of the square erosion kernel.
const ERODE_KERNEL: u32 = 2;

/// On-device captcha resolution pipeline.
///
/// Holds a shared recognition engine injected at construction; cloning the
/// pipeline or sharing it across tasks reuses the same engine instance.
///
/// # Example
/// ```ignore
/// use captext::{LocalPipeline, OnnxRecognizer};
/// use std::sync::Arc;
///
/// let recognizer = Arc::new(OnnxRecognizer::from_files(model_path, charset_path)?);
/// let pipeline = LocalPipeline::new(recognizer);
/// let code = pipeline.solve(&image_base64).await?;
/// ```
#[derive(Clone)]
pub struct LocalPipeline {
    recognizer: Arc<dyn TextRecognizer>,
}

impl LocalPipeline {
    /// Create a pipeline around a recognition engine.
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Resolve a base64-encoded captcha image on-device.
    ///
    /// The cleaned raster is dispatched to the recognition engine on the
    /// blocking worker pool so inference cannot starve concurrent
    /// cooperative tasks; the caller suspends until the worker returns. The
    /// first recognized line is returned with interior whitespace stripped.
    ///
    /// # Errors
    /// An undecodable payload, a failed transform, or a recognition fault
    /// is returned as `Err` — callers relying on the uniform
    /// [`SolveOutcome`](crate::models::SolveOutcome) convention must use the
    /// remote solver instead.
    pub async fn solve(&self, image_base64: &str) -> Result<String> {
        let bytes = BASE64.decode(image_base64)?;
        let image = image::load_from_memory(&bytes).map_err(|e| {
            CaptextError::ImageProcessing(format!("failed to decode captcha image: {e}"))
        })?;

        let cleaned = clean_raster(&image);
        let buffer = encode_png(cleaned)?;

        let recognizer = Arc::clone(&self.recognizer);
        let lines = tokio::task::spawn_blocking(move || recognizer.recognize(&buffer))
            .await
            .map_err(|e| CaptextError::Recognition(format!("recognition worker failed: {e}")))??;

        let first = lines
            .into_iter()
            .next()
            .ok_or_else(|| CaptextError::Recognition("no text detected in image".into()))?;
        tracing::debug!(confidence = first.confidence, "recognized captcha text");

        Ok(first.text.split_whitespace().collect())
    }
}

/// Binarize and thin the raster so only character strokes remain.
fn clean_raster(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    // Dark ink on light background becomes white-on-black foreground
    let binary = threshold(&gray, BINARY_THRESHOLD, ThresholdType::BinaryInverted);
    erode(&binary, ERODE_KERNEL)
}

/// Morphological erosion with a square kernel anchored top-left.
///
/// Minimum over the in-bounds part of the window, which matches a
/// replicated border for binary images.
fn erode(image: &GrayImage, kernel: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut output = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut min = u8::MAX;
            for ky in 0..kernel {
                for kx in 0..kernel {
                    let px = x + kx;
                    let py = y + ky;
                    if px < width && py < height {
                        min = min.min(image.get_pixel(px, py)[0]);
                    }
                }
            }
            output.put_pixel(x, y, image::Luma([min]));
        }
    }

    output
}

/// Re-encode the processed raster as PNG bytes for the recognition engine.
fn encode_png(image: GrayImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| {
            CaptextError::ImageProcessing(format!("failed to encode cleaned image: {e}"))
        })?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::Recognition;
    use image::{Luma, Rgb, RgbImage};

    struct FixedRecognizer {
        lines: Vec<Recognition>,
    }

    impl FixedRecognizer {
        fn with_text(text: &str) -> Arc<Self> {
            Arc::new(Self {
                lines: vec![Recognition {
                    text: text.to_string(),
                    confidence: 0.99,
                }],
            })
        }
    }

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _image: &[u8]) -> Result<Vec<Recognition>> {
            Ok(self.lines.clone())
        }
    }

    /// Light background with a dark bar of "ink" pixels, PNG-encoded.
    fn sample_image_base64() -> String {
        let mut img = RgbImage::from_pixel(60, 20, Rgb([230, 230, 230]));
        for x in 10..50 {
            for y in 8..12 {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        BASE64.encode(buffer.into_inner())
    }

    #[tokio::test]
    async fn test_solve_strips_interior_whitespace() {
        let pipeline = LocalPipeline::new(FixedRecognizer::with_text("AB 1234"));
        let text = pipeline.solve(&sample_image_base64()).await.unwrap();
        assert_eq!(text, "AB1234");
    }

    #[tokio::test]
    async fn test_solve_invalid_base64_is_a_fault() {
        let pipeline = LocalPipeline::new(FixedRecognizer::with_text("AB1234"));
        let err = pipeline.solve("!!not base64!!").await.unwrap_err();
        assert!(matches!(err, CaptextError::Base64(_)));
    }

    #[tokio::test]
    async fn test_solve_undecodable_image_is_a_fault() {
        let pipeline = LocalPipeline::new(FixedRecognizer::with_text("AB1234"));
        let garbage = BASE64.encode(b"not an image");
        let err = pipeline.solve(&garbage).await.unwrap_err();
        assert!(matches!(err, CaptextError::ImageProcessing(_)));
    }

    #[tokio::test]
    async fn test_solve_no_text_is_a_fault() {
        struct EmptyRecognizer;
        impl TextRecognizer for EmptyRecognizer {
            fn recognize(&self, _image: &[u8]) -> Result<Vec<Recognition>> {
                Ok(Vec::new())
            }
        }

        let pipeline = LocalPipeline::new(Arc::new(EmptyRecognizer));
        let err = pipeline.solve(&sample_image_base64()).await.unwrap_err();
        assert!(matches!(err, CaptextError::Recognition(_)));
    }

    #[tokio::test]
    async fn test_recognizer_faults_propagate() {
        struct FailingRecognizer;
        impl TextRecognizer for FailingRecognizer {
            fn recognize(&self, _image: &[u8]) -> Result<Vec<Recognition>> {
                Err(CaptextError::Recognition("engine crashed".into()))
            }
        }

        let pipeline = LocalPipeline::new(Arc::new(FailingRecognizer));
        let err = pipeline.solve(&sample_image_base64()).await.unwrap_err();
        assert!(matches!(err, CaptextError::Recognition(_)));
    }

    #[test]
    fn test_clean_raster_inverts_ink() {
        // 4x4 light background with one dark pixel region
        let mut img = RgbImage::from_pixel(4, 4, Rgb([230, 230, 230]));
        img.put_pixel(1, 1, Rgb([20, 20, 20]));
        img.put_pixel(2, 1, Rgb([20, 20, 20]));
        img.put_pixel(1, 2, Rgb([20, 20, 20]));
        img.put_pixel(2, 2, Rgb([20, 20, 20]));

        let cleaned = clean_raster(&DynamicImage::ImageRgb8(img));

        // The 2x2 ink block survives erosion only at its anchor pixel
        assert_eq!(cleaned.get_pixel(1, 1)[0], 255);
        assert_eq!(cleaned.get_pixel(0, 0)[0], 0);
        assert_eq!(cleaned.get_pixel(3, 3)[0], 0);
    }

    #[test]
    fn test_erode_removes_isolated_pixel() {
        let mut img = GrayImage::new(8, 8);
        img.put_pixel(4, 4, Luma([255]));

        let eroded = erode(&img, 2);
        assert!(eroded.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_erode_shrinks_block() {
        let mut img = GrayImage::new(8, 8);
        for y in 2..5 {
            for x in 2..5 {
                img.put_pixel(x, y, Luma([255]));
            }
        }

        let eroded = erode(&img, 2);
        // 3x3 block shrinks to the 2x2 whose windows stay inside it
        for y in 0..8 {
            for x in 0..8 {
                let expected = (2..4).contains(&x) && (2..4).contains(&y);
                assert_eq!(eroded.get_pixel(x, y)[0] == 255, expected, "at ({x},{y})");
            }
        }
    }
}
