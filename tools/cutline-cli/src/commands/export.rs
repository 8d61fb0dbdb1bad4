//! Export an edit document through a processing backend.

use std::io::Write;
use std::path::PathBuf;

use cutline_common::config::AppConfig;
use cutline_common::error::CutlineError;
use cutline_editor::{EditorSession, ExportState};
use cutline_export_engine::compress::{quick_compress, QUICK_COMPRESS_SIZE};
use cutline_export_engine::executor::{ExportExecutor, ExportProgress};
use cutline_export_engine::plan::PlanOptions;
use cutline_export_engine::service::ProcessingService;
use cutline_export_engine::thumbnails::generate_timeline_thumbnails;
use cutline_export_engine::DryRunService;
use cutline_project_model::time::secs_to_ms;

use crate::document::EditDocument;

pub async fn run(
    path: PathBuf,
    backend: String,
    thumbnails: bool,
    compress: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Exporting edit document at: {}", path.display());

    let doc = EditDocument::load(&path)?;
    let log = doc
        .to_log()
        .map_err(|e| anyhow::anyhow!("Failed to replay operations: {e}"))?;

    let service: Box<dyn ProcessingService> = match backend.as_str() {
        "dry-run" => Box::new(DryRunService::new()),
        _ => {
            return Err(CutlineError::unsupported(format!(
                "backend '{backend}' (available: dry-run)"
            ))
            .into());
        }
    };

    let mut session = EditorSession::restore(doc.source.clone(), log, config.editor.clone())?;
    let ticket = session.begin_export_with(&PlanOptions::from(&config.export))?;

    println!("  Backend: {}", service.name());
    println!("  Steps: {}", ticket.plan.total_steps());
    for skipped in ticket.plan.skipped() {
        println!("  Skipped {} ({}): {}", skipped.kind, skipped.operation, skipped.reason);
    }

    let cancel = ticket.cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  Cancelling after the current step...");
            cancel.cancel();
        }
    });

    let progress_cb = Box::new(|p: ExportProgress| {
        print!(
            "\r  Progress: {:>3}% ({}/{} steps) {:<40}",
            p.percent, p.steps_completed, p.total_steps, p.description
        );
        std::io::stdout().flush().ok();
    });

    let mut executor = ExportExecutor::new(service.as_ref())
        .with_cancel(ticket.cancel.clone())
        .with_progress(progress_cb);
    let result = executor.run(&ticket.plan).await;
    ctrl_c.abort();
    println!();

    session.finish_export(result);
    let output = match session.export_state() {
        ExportState::Done { output, degraded } => {
            println!("Export complete: {output}");
            if *degraded {
                println!("  Warning: some edits could not be applied by this backend");
            }
            output.clone()
        }
        ExportState::Failed { message } => {
            return Err(anyhow::anyhow!("Export failed: {message}"));
        }
        ExportState::Idle => {
            println!("Export cancelled.");
            return Ok(());
        }
        ExportState::Running { .. } => {
            return Err(anyhow::anyhow!("Export did not finish"));
        }
    };

    if compress {
        let (width, height) = QUICK_COMPRESS_SIZE;
        let compressed = quick_compress(service.as_ref(), &output, width, height).await?;
        println!("Compressed copy ({width}x{height}): {compressed}");
    }

    if thumbnails {
        let duration_ms = secs_to_ms(doc.source.duration_secs);
        let thumbs = generate_timeline_thumbnails(
            service.as_ref(),
            &doc.source.origin,
            config.export.thumbnail_count,
            duration_ms,
        )
        .await;
        println!("Timeline thumbnails ({}):", thumbs.len());
        for thumb in &thumbs {
            println!("  {:>8}ms  {}", thumb.time_ms, thumb.frame);
        }
    }

    Ok(())
}
