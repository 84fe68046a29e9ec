use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use certifact_client::app_state::AppContext;
use certifact_client::config::AppConfig;
use certifact_client::models::job::JobStatus;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    let Some(file_path) = std::env::args().nth(1) else {
        eprintln!("usage: certifact-client <media-file>");
        return ExitCode::FAILURE;
    };

    let ctx = AppContext::new(&config).expect("Failed to initialize application context");

    let bytes = match std::fs::read(&file_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("cannot read {file_path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let file_name = Path::new(&file_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.clone());

    let mut handle = match ctx.tracker.submit(&file_name, bytes).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "submission failed");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(job_id = %handle.job_id(), "tracking analysis job");

    let final_status = handle.wait().await;
    match final_status {
        JobStatus::Done => {
            let result = handle.result().expect("done job has a result");
            println!(
                "{}: {} (confidence {:.1}%)",
                file_name,
                result.label,
                result.confidence * 100.0
            );
            println!("history now holds {} result(s)", ctx.history.len());
            ExitCode::SUCCESS
        }
        status => {
            for notification in ctx.notifications.list() {
                eprintln!("[{}] {}: {}", notification.severity, notification.title, notification.message);
            }
            tracing::error!(status = %status, "job did not complete");
            ExitCode::FAILURE
        }
    }
}
