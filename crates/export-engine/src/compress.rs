//! Quick re-encode of a finished export for previews and sharing.

use cutline_common::error::{CutlineError, CutlineResult};
use cutline_project_model::source::MediaRef;

use crate::service::{ProcessingService, TranscodeRequest};

/// Default target for [`quick_compress`]: 720x1280 portrait.
pub const QUICK_COMPRESS_SIZE: (u32, u32) = (720, 1280);

/// Transcode `media` to `width`x`height`, leaving the bitrate to the backend.
pub async fn quick_compress(
    service: &dyn ProcessingService,
    media: &MediaRef,
    width: u32,
    height: u32,
) -> CutlineResult<MediaRef> {
    if width == 0 || height == 0 {
        return Err(CutlineError::invalid_operation(format!(
            "compress target must be non-zero, got {width}x{height}"
        )));
    }

    let request = TranscodeRequest {
        width,
        height,
        bitrate: 0,
    };
    let output = service
        .transcode(media, &request)
        .await
        .map_err(|e| {
            CutlineError::processing_failure(format!("Compressing to {width}x{height}"), e)
        })?;
    tracing::info!(input = %media, output = %output, width, height, "Quick compress finished");
    Ok(output)
}
