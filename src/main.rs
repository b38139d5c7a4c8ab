// Main entry point for the terminal YouTube downloader
// Sets up logging and config, then hands the terminal to the TUI

mod config;
mod logging;
mod player;
mod ui;
mod worker;
mod youtube;

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use config::AppConfig;
use ui::App;
use youtube::YtDlp;

// Workers stuck in a subprocess must not keep the process alive.
const RUNTIME_SHUTDOWN: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    // Suppress ALSA error messages that pollute TUI
    std::env::set_var("ALSA_PCM_NO_MMAP", "1");

    let log_path = logging::init()?;
    let config = AppConfig::load()?;
    tracing::info!(log = %log_path.display(), ?config, "starting");

    std::fs::create_dir_all(&config.download_dir).with_context(|| {
        format!(
            "Failed to create download directory {}",
            config.download_dir.display()
        )
    })?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    let yt_dlp = Arc::new(YtDlp::new(config.yt_dlp.clone()));
    let result = runtime.block_on(async {
        let mut app = App::new(config, yt_dlp.clone(), yt_dlp);
        app.run().await
    });

    runtime.shutdown_timeout(RUNTIME_SHUTDOWN);
    tracing::info!("exited");
    result
}
