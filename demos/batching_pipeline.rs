//! Batching pipeline example
//!
//! Demonstrates level routing, batched file output with a console fallback,
//! and flushing everything on shutdown.
//!
//! Run with: cargo run --example batching_pipeline

use rust_log_facade::prelude::*;
use rust_log_facade::targets::{ConsoleTarget, FileSink};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Rust Log Facade - Batching Pipeline Example ===\n");

    // Errors go straight to the console
    let console = Arc::new(ConsoleTarget::new());

    // Everything from Debug up is batched into a JSON file, falling back
    // to the console when the file cannot be written
    let sink = FileSink::new("batching_pipeline.log")?.with_format(RecordFormat::Json);
    let file = BatchingTarget::new(
        sink,
        BatchConfig::new()
            .max_size(20)
            .max_retries(3)
            .retry_delay(0.1),
    )?
    .with_fallback(console.clone());

    let factory = LoggerFactory::builder()
        .min_level(LogLevel::Debug)
        .target(Arc::new(file), LogLevel::Debug)
        .target(console, LogLevel::Error)
        .on_dispose_error(Arc::new(|err| eprintln!("flush failed: {}", err)))
        .build();

    println!("1. Logging through two named loggers:");
    let api = factory.get_logger("api");
    let db = factory.get_logger("db");

    for i in 0..50 {
        api.log_with(
            LogLevel::Information,
            "Request {} processed",
            vec![i.into()],
            Fields::new().with_field("status", 200),
        )
        .await?;
        if i % 10 == 0 {
            db.debug(format!("Connection pool checked at request {}", i)).await;
        }
    }

    println!("\n2. Errors reach the console immediately:");
    let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "query timed out");
    db.exception("Query failed", Some(&io)).await;

    println!("\n3. Flushing on shutdown:");
    let failures = factory.dispose().await;
    println!("   Flushed with {} failed targets", failures);

    println!("\nSee batching_pipeline.log for the batched records");
    Ok(())
}
