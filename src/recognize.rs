//! Text recognition capability consumed by the local pipeline.
//!
//! The recognition engine is a black box behind [`TextRecognizer`]: it takes
//! a compressed-image byte buffer and returns ordered line predictions. The
//! pipeline is injected with an implementation, so it can be exercised with
//! fakes in tests and backed by the ONNX engine in production.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One detected line of text with its recognition confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recognition {
    /// Recognized line text.
    pub text: String,
    /// Recognition confidence (0.0 to 1.0).
    pub confidence: f32,
}

/// Recognition engine interface.
///
/// Implementations must be safe to share across concurrent solve calls:
/// each call's image buffer and result are independent. `recognize` is
/// invoked from a blocking worker thread, never from the async scheduler.
pub trait TextRecognizer: Send + Sync {
    /// Recognize text in a compressed-image byte buffer.
    ///
    /// # Returns
    /// Detected lines in reading order, best-first for each region. An empty
    /// vector means no text was found.
    fn recognize(&self, image: &[u8]) -> Result<Vec<Recognition>>;
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxRecognizer;

#[cfg(feature = "onnx")]
mod onnx {
    use super::{Recognition, TextRecognizer};
    use crate::error::{CaptextError, Result};
    use image::DynamicImage;
    use ndarray::Array4;
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use std::path::Path;
    use std::sync::Mutex;

    /// Model input height; widths are aspect-scaled up to [`REC_INPUT_WIDTH`].
    const REC_INPUT_HEIGHT: u32 = 48;

    /// Maximum model input width; narrower inputs are zero-padded.
    const REC_INPUT_WIDTH: u32 = 320;

    /// English-only CTC text recognizer over an ONNX model.
    ///
    /// Loads a single-line recognition model (PaddleOCR English rec export
    /// or compatible) plus its character dictionary. No orientation
    /// classification is applied; the printed codes this client targets are
    /// always upright.
    pub struct OnnxRecognizer {
        // ort sessions require exclusive access to run
        session: Mutex<Session>,
        charset: Vec<String>,
    }

    impl OnnxRecognizer {
        /// Create a recognizer from an ONNX model and a charset file with
        /// one dictionary entry per line.
        pub fn from_files(model: impl AsRef<Path>, charset: impl AsRef<Path>) -> Result<Self> {
            let charset: Vec<String> = std::fs::read_to_string(charset)?
                .lines()
                .map(|line| line.to_string())
                .collect();

            let session = Session::builder()
                .map_err(|e| {
                    CaptextError::Recognition(format!("failed to create ONNX session builder: {e}"))
                })?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| {
                    CaptextError::Recognition(format!("failed to set optimization level: {e}"))
                })?
                .commit_from_file(model.as_ref())
                .map_err(|e| CaptextError::Recognition(format!("failed to load ONNX model: {e}")))?;

            Ok(Self {
                session: Mutex::new(session),
                charset,
            })
        }

        /// Preprocess to the model's `[1, 3, H, W]` layout, normalized to
        /// `[-1, 1]`, zero-padded on the right.
        fn prepare_input(&self, img: &DynamicImage) -> Array4<f32> {
            let rgb = img.to_rgb8();
            let (orig_w, orig_h) = rgb.dimensions();

            let scale = REC_INPUT_HEIGHT as f64 / orig_h as f64;
            let target_w = ((orig_w as f64 * scale).round() as u32).clamp(1, REC_INPUT_WIDTH);
            let resized = image::imageops::resize(
                &rgb,
                target_w,
                REC_INPUT_HEIGHT,
                image::imageops::FilterType::Lanczos3,
            );

            let mut input = Array4::<f32>::zeros((
                1,
                3,
                REC_INPUT_HEIGHT as usize,
                REC_INPUT_WIDTH as usize,
            ));
            for y in 0..REC_INPUT_HEIGHT {
                for x in 0..target_w {
                    let pixel = resized.get_pixel(x, y);
                    for c in 0..3 {
                        input[[0, c, y as usize, x as usize]] =
                            (pixel[c] as f32 / 255.0 - 0.5) / 0.5;
                    }
                }
            }

            input
        }
    }

    impl TextRecognizer for OnnxRecognizer {
        fn recognize(&self, image: &[u8]) -> Result<Vec<Recognition>> {
            let img = image::load_from_memory(image).map_err(|e| {
                CaptextError::ImageProcessing(format!("failed to load image for recognition: {e}"))
            })?;

            let input = self.prepare_input(&img);
            let input_value = ort::value::Value::from_array(input).map_err(|e| {
                CaptextError::Recognition(format!("failed to create input tensor: {e}"))
            })?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| CaptextError::Recognition("recognizer session poisoned".into()))?;
            let outputs = session
                .run(ort::inputs![input_value])
                .map_err(|e| CaptextError::Recognition(format!("ONNX inference failed: {e}")))?;

            let (_, output_value) = outputs
                .iter()
                .next()
                .ok_or_else(|| CaptextError::Recognition("no output from model".into()))?;
            let (shape, data) = output_value.try_extract_tensor::<f32>().map_err(|e| {
                CaptextError::Recognition(format!("failed to extract output tensor: {e}"))
            })?;

            let classes = shape[shape.len() - 1] as usize;
            if classes == 0 || data.is_empty() {
                return Err(CaptextError::Recognition("empty model output".into()));
            }

            let (text, confidence) = decode_ctc(data, classes, &self.charset);
            Ok(vec![Recognition { text, confidence }])
        }
    }

    /// Greedy CTC decode: per-frame argmax, collapse repeats, drop blanks.
    ///
    /// Class 0 is the CTC blank; class `i >= 1` maps to `charset[i - 1]`,
    /// with one trailing space class appended by the training dictionary.
    fn decode_ctc(data: &[f32], classes: usize, charset: &[String]) -> (String, f32) {
        let mut text = String::new();
        let mut confidences = Vec::new();
        let mut previous = 0usize;

        for frame in data.chunks(classes) {
            let (idx, prob) = argmax(frame);
            if idx != 0 && idx != previous {
                if let Some(entry) = lookup(charset, idx) {
                    text.push_str(entry);
                    confidences.push(prob);
                }
            }
            previous = idx;
        }

        let confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f32>() / confidences.len() as f32
        };
        (text, confidence)
    }

    fn lookup(charset: &[String], class_idx: usize) -> Option<&str> {
        if class_idx == 0 {
            None
        } else if class_idx <= charset.len() {
            Some(charset[class_idx - 1].as_str())
        } else if class_idx == charset.len() + 1 {
            Some(" ")
        } else {
            None
        }
    }

    fn argmax(frame: &[f32]) -> (usize, f32) {
        let mut max_idx = 0;
        let mut max_val = f32::NEG_INFINITY;
        for (idx, &val) in frame.iter().enumerate() {
            if val > max_val {
                max_val = val;
                max_idx = idx;
            }
        }
        (max_idx, max_val)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn charset() -> Vec<String> {
            ["A", "B", "1"].iter().map(|s| s.to_string()).collect()
        }

        fn frame(classes: usize, hot: usize) -> Vec<f32> {
            let mut frame = vec![0.05; classes];
            frame[hot] = 0.9;
            frame
        }

        #[test]
        fn test_decode_ctc_collapses_repeats_and_blanks() {
            // Frames: A A blank A B -> "AAB" after collapse rules
            let classes = 5;
            let data: Vec<f32> = [
                frame(classes, 1),
                frame(classes, 1),
                frame(classes, 0),
                frame(classes, 1),
                frame(classes, 2),
            ]
            .concat();

            let (text, confidence) = decode_ctc(&data, classes, &charset());
            assert_eq!(text, "AAB");
            assert!((confidence - 0.9).abs() < 1e-6);
        }

        #[test]
        fn test_decode_ctc_space_class() {
            // Class charset.len() + 1 is the appended space entry
            let classes = 5;
            let data: Vec<f32> =
                [frame(classes, 1), frame(classes, 4), frame(classes, 3)].concat();

            let (text, _) = decode_ctc(&data, classes, &charset());
            assert_eq!(text, "A 1");
        }

        #[test]
        fn test_decode_ctc_all_blank() {
            let classes = 5;
            let data: Vec<f32> = [frame(classes, 0), frame(classes, 0)].concat();

            let (text, confidence) = decode_ctc(&data, classes, &charset());
            assert!(text.is_empty());
            assert_eq!(confidence, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_serde() {
        let recognition = Recognition {
            text: "AB1234".to_string(),
            confidence: 0.97,
        };
        let json = serde_json::to_string(&recognition).unwrap();
        let parsed: Recognition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.text, "AB1234");
        assert!((parsed.confidence - 0.97).abs() < f32::EPSILON);
    }
}
