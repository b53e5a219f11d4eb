//! Storage walkthrough
//!
//! Builds a small tree, moves part of it and prints the result.
//!
//! Run with:
//! ```bash
//! # In-memory host, pretty logs
//! cargo run -p core-storage --example storage_demo
//!
//! # Directory on disk, JSON logs
//! cargo run -p core-storage --example storage_demo -- /tmp/sandboxfs-demo json
//! ```

use bridge_desktop::TokioStorageHost;
use bridge_memory::MemoryStorageHost;
use bridge_traits::{
    time::{ConsoleLogger, LogLevel},
    StorageHost,
};
use core_runtime::config::StorageConfig;
use core_runtime::logging::{LogFormat, LoggingConfig};
use core_storage::Storage;
use std::env;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(2).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };
    // Warnings are mirrored to stderr as single lines.
    let logging = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug)
        .with_logger_sink(Arc::new(ConsoleLogger {
            min_level: LogLevel::Warn,
        }));

    let host: Arc<dyn StorageHost> = match args.get(1) {
        Some(dir) => Arc::new(TokioStorageHost::new(dir).with_quota(64 * 1024 * 1024)),
        None => Arc::new(MemoryStorageHost::new().with_quota(1024 * 1024)),
    };
    let config = StorageConfig::builder()
        .host(host)
        .max_concurrent_tasks(4)
        .logging(logging)
        .build()?;
    config.install_logging()?;
    let storage = Storage::new(config)?;

    storage.write("projects/site/index.html", "<h1>hi</h1>").await?;
    storage.write("projects/site/css/main.css", "h1 { color: teal; }").await?;
    storage.write("projects/notes.md", "# Notes").await?;
    storage.append("projects/notes.md", "\n- ship it").await?;
    storage.create_directory("archive").await?;

    info!("Before move:\n{}", storage.render_tree("").await?);

    storage.rename_directory("projects/site", "archive/site-v1").await?;
    info!("After move:\n{}", storage.render_tree("").await?);

    let quota = storage.quota().await?;
    info!(used = quota.used, available = quota.available, "Quota");

    let url = storage.read("projects/notes.md").await?.as_data_url().await?;
    info!(url = %url, "Notes as data URL");

    Ok(())
}
