//! # captext
//!
//! An image-to-text captcha resolution client for bot-driven account
//! automation. Given a rendered captcha image, returns plain text matching
//! the expected answer.
//!
//! ## Strategies
//!
//! Two independent resolution strategies, selectable per call:
//!
//! - **Remote solver**: submits the base64 image to a hosted task-based
//!   solving API, then polls for the asynchronous result with a bounded
//!   linear backoff. Every failure is normalized into a typed outcome.
//! - **Local pipeline**: binarizes and denoises the image on-device, then
//!   dispatches it to an injected OCR engine off the async scheduler. No
//!   network dependency; faults propagate.
//!
//! ## Quick Start
//!
//! ```ignore
//! use captext::{RemoteSolver, SolveRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let solver = RemoteSolver::builder("your_api_key").build()?;
//!
//!     let outcome = solver.solve(&SolveRequest::new(image_base64)).await;
//!     if outcome.success {
//!         println!("answer: {}", outcome.text);
//!     } else if let Some(task_id) = &outcome.task_id {
//!         println!("failed: {} (task {})", outcome.text, task_id);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Local Fallback
//!
//! ```ignore
//! use captext::{LocalPipeline, OnnxRecognizer};
//! use std::sync::Arc;
//!
//! let recognizer = Arc::new(OnnxRecognizer::from_files("rec.onnx", "en_dict.txt")?);
//! let pipeline = LocalPipeline::new(recognizer);
//! let code = pipeline.solve(&image_base64).await?;
//! ```
//!
//! ## With Proxy
//!
//! ```ignore
//! let solver = RemoteSolver::builder("your_api_key")
//!     .proxy("socks5://127.0.0.1:1080")
//!     .build()?;
//! ```
//!
//! The local recognition engine requires the `onnx` feature; any other
//! engine can be plugged in through the [`TextRecognizer`] trait.

// Allow missing docs for internal types for now
#![allow(missing_docs)]

pub mod client;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod recognize;

// Re-exports for convenience
pub use client::{RemoteSolver, RemoteSolverBuilder, Submission};
pub use error::{CaptextError, Result};
pub use models::{ReportOutcome, SolveOutcome, SolveRequest, Task, TaskId};
pub use pipeline::LocalPipeline;
pub use recognize::{Recognition, TextRecognizer};

#[cfg(feature = "onnx")]
pub use recognize::OnnxRecognizer;
