//! Show edit document information.

use std::path::PathBuf;

use cutline_project_model::time::format_time;

use crate::document::EditDocument;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let doc = EditDocument::load(&path)?;
    let log = doc
        .to_log()
        .map_err(|e| anyhow::anyhow!("Failed to replay operations: {e}"))?;
    let source = &doc.source;

    println!("Source: {}", source.origin);
    println!("  Resolution: {}x{}", source.width, source.height);
    println!("  Duration: {}", format_time(source.duration_secs));
    if source.rotation_degrees != 0 {
        println!("  Rotation: {}°", source.rotation_degrees);
    }
    if let Some(fps) = source.frame_rate {
        println!("  Frame rate: {fps}fps");
    }
    if let Some(bitrate) = source.bitrate {
        println!("  Bitrate: {} kbps", bitrate / 1000);
    }
    println!();

    println!("Operations ({}):", log.len());
    for op in &log {
        println!("  [{}] {}", op.kind(), op.edit.summary());
    }
    println!();

    println!(
        "Effective duration: {}",
        format_time(log.effective_duration(source.duration_secs))
    );

    Ok(())
}
