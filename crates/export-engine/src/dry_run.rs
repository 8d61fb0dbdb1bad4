//! A processing backend that records calls instead of touching media.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use cutline_project_model::source::MediaRef;

use crate::service::{ProcessConfig, ProcessingService, TextOverlayRequest, TranscodeRequest};

/// One recorded service call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ServiceCall {
    ProcessVideo {
        input: MediaRef,
        config: ProcessConfig,
    },
    AddTextOverlay {
        input: MediaRef,
        overlay: TextOverlayRequest,
    },
    MergeSideBySide {
        input: MediaRef,
        other: MediaRef,
    },
    MergeTopBottom {
        input: MediaRef,
        other: MediaRef,
    },
    Transcode {
        input: MediaRef,
        request: TranscodeRequest,
    },
    ExtractFrame {
        input: MediaRef,
        time_ms: u64,
    },
}

/// Records every call and answers with `dry-run://<n>`, where `n` is the
/// 1-based call number.
#[derive(Debug, Default)]
pub struct DryRunService {
    calls: Mutex<Vec<ServiceCall>>,
    fail_on: Option<usize>,
}

impl DryRunService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service whose `n`-th call (1-based) fails after being recorded.
    pub fn failing_on(n: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(n),
        }
    }

    /// Snapshot of recorded calls, in order.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ServiceCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: ServiceCall) -> anyhow::Result<MediaRef> {
        let mut calls = self.lock();
        calls.push(call);
        let n = calls.len();
        tracing::debug!(call = n, "Dry-run service call recorded");
        if self.fail_on == Some(n) {
            anyhow::bail!("dry-run failure injected at call {n}");
        }
        Ok(MediaRef::new(format!("dry-run://{n}")))
    }
}

#[async_trait]
impl ProcessingService for DryRunService {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn process_video(
        &self,
        input: &MediaRef,
        config: &ProcessConfig,
    ) -> anyhow::Result<MediaRef> {
        self.record(ServiceCall::ProcessVideo {
            input: input.clone(),
            config: config.clone(),
        })
    }

    async fn add_text_overlay(
        &self,
        input: &MediaRef,
        overlay: &TextOverlayRequest,
    ) -> anyhow::Result<MediaRef> {
        self.record(ServiceCall::AddTextOverlay {
            input: input.clone(),
            overlay: overlay.clone(),
        })
    }

    async fn merge_side_by_side(
        &self,
        input: &MediaRef,
        other: &MediaRef,
    ) -> anyhow::Result<MediaRef> {
        self.record(ServiceCall::MergeSideBySide {
            input: input.clone(),
            other: other.clone(),
        })
    }

    async fn merge_top_bottom(
        &self,
        input: &MediaRef,
        other: &MediaRef,
    ) -> anyhow::Result<MediaRef> {
        self.record(ServiceCall::MergeTopBottom {
            input: input.clone(),
            other: other.clone(),
        })
    }

    async fn transcode(
        &self,
        input: &MediaRef,
        request: &TranscodeRequest,
    ) -> anyhow::Result<MediaRef> {
        self.record(ServiceCall::Transcode {
            input: input.clone(),
            request: *request,
        })
    }

    async fn extract_frame(&self, input: &MediaRef, time_ms: u64) -> anyhow::Result<MediaRef> {
        self.record(ServiceCall::ExtractFrame {
            input: input.clone(),
            time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_references_are_numbered() {
        let service = DryRunService::new();
        let a = service
            .process_video(&MediaRef::new("file:///a.mp4"), &ProcessConfig::default())
            .await
            .unwrap();
        let b = service
            .merge_top_bottom(&a, &MediaRef::new("file:///b.mp4"))
            .await
            .unwrap();
        assert_eq!(a.as_str(), "dry-run://1");
        assert_eq!(b.as_str(), "dry-run://2");
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let service = DryRunService::failing_on(1);
        let result = service.extract_frame(&MediaRef::new("file:///a.mp4"), 500).await;
        assert!(result.is_err());
        assert_eq!(
            service.calls(),
            vec![ServiceCall::ExtractFrame {
                input: MediaRef::new("file:///a.mp4"),
                time_ms: 500,
            }]
        );
    }
}
