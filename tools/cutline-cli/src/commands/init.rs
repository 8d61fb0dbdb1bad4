//! Create a new edit document.

use std::path::PathBuf;

use cutline_project_model::source::VideoSource;

use crate::document::EditDocument;

pub fn run(
    path: PathBuf,
    source: String,
    duration: f64,
    width: u32,
    height: u32,
    fps: Option<f64>,
    force: bool,
) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let mut video = VideoSource::new(source, duration, width, height)
        .map_err(|e| anyhow::anyhow!("Invalid source: {e}"))?;
    if let Some(fps) = fps {
        video = video.with_frame_rate(fps);
    }

    let doc = EditDocument::new(video);
    doc.save(&path)?;

    println!("Edit document created at {}", path.display());
    println!("  Source: {}", doc.source.origin);
    println!("  Resolution: {}x{}", width, height);
    println!("  Duration: {duration:.1}s");

    Ok(())
}
