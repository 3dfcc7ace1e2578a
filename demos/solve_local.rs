//! Example: resolving a printed code on-device with the ONNX recognizer.
//!
//! Run with: cargo run --example solve_local --features onnx -- \
//!     <model.onnx> <charset.txt> <image-file>

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use captext::{LocalPipeline, OnnxRecognizer};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let (model, charset, image_path) = match (args.next(), args.next(), args.next()) {
        (Some(model), Some(charset), Some(path)) => (model, charset, path),
        _ => anyhow::bail!("usage: solve_local <model.onnx> <charset.txt> <image-file>"),
    };

    let recognizer = Arc::new(OnnxRecognizer::from_files(model, charset)?);
    let pipeline = LocalPipeline::new(recognizer);

    let image = STANDARD.encode(std::fs::read(&image_path)?);
    let code = pipeline.solve(&image).await?;
    println!("Recognized: {code}");

    Ok(())
}
