//! Example: resolving a captcha image through the remote solving service.
//!
//! Run with: cargo run --example solve_remote -- <api-key> <image-file>

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use captext::{RemoteSolver, SolveRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output (optional)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let (api_key, image_path) = match (args.next(), args.next()) {
        (Some(key), Some(path)) => (key, path),
        _ => anyhow::bail!("usage: solve_remote <api-key> <image-file>"),
    };

    let image = STANDARD.encode(std::fs::read(&image_path)?);
    let solver = RemoteSolver::builder(api_key).build()?;

    let outcome = solver.solve(&SolveRequest::new(image)).await;
    if outcome.success {
        println!("Solved: {}", outcome.text);
        if let Some(task_id) = &outcome.task_id {
            println!("Task: {task_id}");
            // A wrong answer can be reported back:
            // solver.report_bad(task_id).await;
        }
    } else {
        println!("Failed: {}", outcome.text);
    }

    Ok(())
}
