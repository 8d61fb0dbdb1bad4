//! Timeline thumbnail extraction.

use serde::Serialize;

use cutline_common::error::{CutlineError, CutlineResult};
use cutline_project_model::source::MediaRef;

use crate::service::ProcessingService;

/// A still frame taken from the source at `time_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnail {
    pub time_ms: u64,
    pub frame: MediaRef,
}

/// `count` evenly spaced sample times: `i * duration / count`.
pub fn thumbnail_times(count: usize, duration_ms: u64) -> Vec<u64> {
    if count == 0 {
        return Vec::new();
    }
    let count = count as u64;
    (0..count).map(|i| i * duration_ms / count).collect()
}

pub async fn extract_thumbnail(
    service: &dyn ProcessingService,
    media: &MediaRef,
    time_ms: u64,
) -> CutlineResult<Thumbnail> {
    let frame = service
        .extract_frame(media, time_ms)
        .await
        .map_err(|e| {
            CutlineError::processing_failure(format!("Extracting frame at {time_ms}ms"), e)
        })?;
    Ok(Thumbnail { time_ms, frame })
}

/// Sample thumbnails across the timeline.
///
/// Frames that fail to extract are skipped, so the result may be shorter
/// than `count`.
pub async fn generate_timeline_thumbnails(
    service: &dyn ProcessingService,
    media: &MediaRef,
    count: usize,
    duration_ms: u64,
) -> Vec<Thumbnail> {
    let mut thumbnails = Vec::with_capacity(count);
    for time_ms in thumbnail_times(count, duration_ms) {
        match extract_thumbnail(service, media, time_ms).await {
            Ok(thumb) => thumbnails.push(thumb),
            Err(e) => tracing::warn!(time_ms, error = %e, "Thumbnail extraction failed; skipping"),
        }
    }
    tracing::debug!(
        requested = count,
        generated = thumbnails.len(),
        "Timeline thumbnails generated"
    );
    thumbnails
}
