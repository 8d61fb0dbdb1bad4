//! Sequential execution of an export plan.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use cutline_common::error::{CutlineError, CutlineResult};
use cutline_project_model::operation::MergeMode;
use cutline_project_model::source::MediaRef;

use crate::plan::{ExportPlan, PlannedStep, StepAction};
use crate::service::ProcessingService;

/// Progress callback for export execution.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Stages of an export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Preparing,
    Processing,
    Finalizing,
    Complete,
}

/// Export progress report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportProgress {
    /// Completion percentage in `[0, 100]`.
    pub percent: u8,

    /// Steps finished so far.
    pub steps_completed: usize,

    /// Step count fixed at planning time.
    pub total_steps: usize,

    pub stage: ExportStage,

    /// Label of the step that just finished.
    pub description: String,
}

/// `round(100 * completed / total)` in integer arithmetic.
///
/// An empty plan is reported as complete.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((200 * completed + total) / (2 * total)) as u8
}

/// Cooperative cancellation flag, checked between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A capability gap hit during an otherwise successful export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportWarning {
    pub step: String,
    pub message: String,
}

/// Result of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    Completed {
        output: MediaRef,
        warnings: Vec<ExportWarning>,
    },
    /// Cancellation was observed at a step boundary.
    Cancelled {
        steps_completed: usize,
        /// Reference produced by the last finished step (the source if none).
        last_output: MediaRef,
    },
}

impl ExportOutcome {
    /// True for a completed export that hit at least one capability gap.
    pub fn is_degraded(&self) -> bool {
        matches!(self, ExportOutcome::Completed { warnings, .. } if !warnings.is_empty())
    }

    /// Final output, if the export completed.
    pub fn output(&self) -> Option<&MediaRef> {
        match self {
            ExportOutcome::Completed { output, .. } => Some(output),
            ExportOutcome::Cancelled { .. } => None,
        }
    }
}

/// State of an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// Created but not started.
    Idle,
    /// Steps are being issued.
    Running { percent: u8 },
    /// Every step finished.
    Done,
    /// A step failed; no further steps were issued.
    Failed,
    /// Stopped at a step boundary.
    Cancelled,
}

/// Runs an [`ExportPlan`] against a [`ProcessingService`], one step at a time.
///
/// Each step consumes the reference produced by the previous one. An
/// executor runs at most once.
pub struct ExportExecutor<'a> {
    service: &'a dyn ProcessingService,
    cancel: CancelToken,
    progress: Option<ProgressCallback>,
    state: ExecutorState,
}

impl<'a> ExportExecutor<'a> {
    pub fn new(service: &'a dyn ProcessingService) -> Self {
        Self {
            service,
            cancel: CancelToken::new(),
            progress: None,
            state: ExecutorState::Idle,
        }
    }

    /// Observe an externally owned cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Handle that cancels this run at the next step boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Execute every step in order.
    ///
    /// A service failure aborts the run with [`CutlineError::ProcessingFailure`]
    /// carrying the failing step's description.
    pub async fn run(&mut self, plan: &ExportPlan) -> CutlineResult<ExportOutcome> {
        if self.state != ExecutorState::Idle {
            return Err(CutlineError::invalid_state("Export executor already used"));
        }

        let total = plan.total_steps();
        tracing::info!(
            backend = self.service.name(),
            source = %plan.source(),
            total_steps = total,
            "Starting export"
        );

        if plan.is_empty() {
            self.state = ExecutorState::Done;
            self.emit(ExportProgress {
                percent: 100,
                steps_completed: 0,
                total_steps: 0,
                stage: ExportStage::Complete,
                description: "Nothing to export".to_string(),
            });
            tracing::info!("Export finished with no steps");
            return Ok(ExportOutcome::Completed {
                output: plan.source().clone(),
                warnings: Vec::new(),
            });
        }

        self.state = ExecutorState::Running { percent: 0 };
        self.emit(ExportProgress {
            percent: 0,
            steps_completed: 0,
            total_steps: total,
            stage: ExportStage::Preparing,
            description: "Preparing".to_string(),
        });

        let mut current = plan.source().clone();
        let mut warnings = Vec::new();

        for (index, step) in plan.steps().iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.state = ExecutorState::Cancelled;
                tracing::info!(steps_completed = index, total_steps = total, "Export cancelled");
                return Ok(ExportOutcome::Cancelled {
                    steps_completed: index,
                    last_output: current,
                });
            }

            tracing::debug!(
                step = index + 1,
                total_steps = total,
                description = %step.description,
                "Running export step"
            );
            current = match self.run_step(step, current, &mut warnings).await {
                Ok(next) => next,
                Err(e) => {
                    self.state = ExecutorState::Failed;
                    tracing::error!(step = %step.description, error = %e, "Export step failed");
                    return Err(CutlineError::processing_failure(&step.description, e));
                }
            };

            let completed = index + 1;
            let percent = progress_percent(completed, total);
            let stage = if completed == total {
                ExportStage::Complete
            } else if matches!(plan.steps()[completed].action, StepAction::Finalize) {
                ExportStage::Finalizing
            } else {
                ExportStage::Processing
            };
            self.state = ExecutorState::Running { percent };
            self.emit(ExportProgress {
                percent,
                steps_completed: completed,
                total_steps: total,
                stage,
                description: step.description.clone(),
            });
        }

        self.state = ExecutorState::Done;
        tracing::info!(
            output = %current,
            warnings = warnings.len(),
            "Export complete"
        );
        Ok(ExportOutcome::Completed {
            output: current,
            warnings,
        })
    }

    async fn run_step(
        &self,
        step: &PlannedStep,
        input: MediaRef,
        warnings: &mut Vec<ExportWarning>,
    ) -> anyhow::Result<MediaRef> {
        match &step.action {
            StepAction::Process { config } => self.service.process_video(&input, config).await,
            StepAction::TextOverlay { request, .. } => {
                self.service.add_text_overlay(&input, request).await
            }
            StepAction::Merge { mode, other, .. } => match mode {
                MergeMode::SideBySide => self.service.merge_side_by_side(&input, other).await,
                MergeMode::TopBottom => self.service.merge_top_bottom(&input, other).await,
                MergeMode::Append => {
                    tracing::warn!(
                        other = %other,
                        "Append merge is not supported by the processing service; step skipped"
                    );
                    warnings.push(ExportWarning {
                        step: step.description.clone(),
                        message: format!(
                            "append merge of {other} is not supported; output unchanged"
                        ),
                    });
                    Ok(input)
                }
            },
            StepAction::Finalize => Ok(input),
        }
    }

    fn emit(&self, progress: ExportProgress) {
        if let Some(cb) = &self.progress {
            cb(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use cutline_project_model::log::OperationLog;
    use cutline_project_model::operation::{Edit, FontWeight, Rotation, TextOverlay};
    use cutline_project_model::source::VideoSource;

    use crate::dry_run::{DryRunService, ServiceCall};
    use crate::plan::plan_export;

    fn source() -> VideoSource {
        VideoSource::new("file:///clip.mp4", 30.0, 1920, 1080).unwrap()
    }

    fn text_and_rotate() -> OperationLog {
        let mut log = OperationLog::new();
        log.commit_edit(Edit::Text(TextOverlay {
            content: "Hi".to_string(),
            x: 0.5,
            y: 0.5,
            font_size: 24.0,
            color: "#FFFFFF".to_string(),
            weight: FontWeight::Bold,
            start_time: 0.0,
            end_time: 2.0,
        }))
        .unwrap();
        log.commit_edit(Edit::Rotate {
            degrees: Rotation::Deg90,
        })
        .unwrap();
        log
    }

    fn recorder() -> (Arc<Mutex<Vec<ExportProgress>>>, ProgressCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (
            seen,
            Box::new(move |p: ExportProgress| sink.lock().unwrap().push(p)),
        )
    }

    #[test]
    fn test_progress_percent_rounds() {
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(0, 0), 100);
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_three_step_export_reports_33_67_100() {
        let plan = plan_export(&source(), &text_and_rotate());
        let service = DryRunService::new();
        let (seen, cb) = recorder();

        let mut executor = ExportExecutor::new(&service).with_progress(cb);
        let outcome = executor.run(&plan).await.unwrap();

        assert_eq!(executor.state(), ExecutorState::Done);
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.output().unwrap().as_str(), "dry-run://2");

        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![0, 33, 67, 100]);
        let stages: Vec<ExportStage> = seen.lock().unwrap().iter().map(|p| p.stage).collect();
        assert_eq!(
            stages,
            vec![
                ExportStage::Preparing,
                ExportStage::Processing,
                ExportStage::Finalizing,
                ExportStage::Complete
            ]
        );

        let calls = service.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], ServiceCall::ProcessVideo { .. }));
        match &calls[1] {
            ServiceCall::AddTextOverlay { input, .. } => assert_eq!(input.as_str(), "dry-run://1"),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_plan_completes_with_source() {
        let plan = plan_export(&source(), &OperationLog::new());
        let service = DryRunService::new();
        let (seen, cb) = recorder();

        let mut executor = ExportExecutor::new(&service).with_progress(cb);
        let outcome = executor.run(&plan).await.unwrap();

        assert_eq!(outcome.output().unwrap().as_str(), "file:///clip.mp4");
        assert_eq!(service.call_count(), 0);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].percent, 100);
        assert_eq!(seen[0].stage, ExportStage::Complete);
    }

    #[tokio::test]
    async fn test_failure_names_step_and_stops() {
        let plan = plan_export(&source(), &text_and_rotate());
        let service = DryRunService::failing_on(2);
        let (seen, cb) = recorder();

        let mut executor = ExportExecutor::new(&service).with_progress(cb);
        let err = executor.run(&plan).await.unwrap_err();

        assert_eq!(executor.state(), ExecutorState::Failed);
        assert_eq!(err.failed_step(), Some("Adding text: \"Hi\""));
        assert_eq!(service.call_count(), 2);
        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![0, 33]);
    }

    #[tokio::test]
    async fn test_append_merge_is_degraded_noop() {
        let mut log = OperationLog::new();
        log.commit_edit(Edit::Merge {
            mode: MergeMode::Append,
            source: MediaRef::new("file:///tail.mp4"),
        })
        .unwrap();
        let plan = plan_export(&source(), &log);
        assert_eq!(plan.total_steps(), 2);

        let service = DryRunService::new();
        let mut executor = ExportExecutor::new(&service);
        let outcome = executor.run(&plan).await.unwrap();

        assert!(outcome.is_degraded());
        assert_eq!(outcome.output().unwrap().as_str(), "file:///clip.mp4");
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_after_first_step_issues_no_more_calls() {
        let plan = plan_export(&source(), &text_and_rotate());
        let service = DryRunService::new();
        let cancel = CancelToken::new();
        let trip = cancel.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut executor = ExportExecutor::new(&service)
            .with_cancel(cancel)
            .with_progress(Box::new(move |p: ExportProgress| {
                if p.steps_completed == 1 {
                    trip.cancel();
                }
                sink.lock().unwrap().push(p.percent);
            }));
        let outcome = executor.run(&plan).await.unwrap();

        assert_eq!(executor.state(), ExecutorState::Cancelled);
        assert_eq!(
            outcome,
            ExportOutcome::Cancelled {
                steps_completed: 1,
                last_output: MediaRef::new("dry-run://1"),
            }
        );
        assert_eq!(service.call_count(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![0, 33]);
    }

    #[tokio::test]
    async fn test_executor_runs_once() {
        let plan = plan_export(&source(), &text_and_rotate());
        let service = DryRunService::new();
        let mut executor = ExportExecutor::new(&service);
        executor.run(&plan).await.unwrap();
        assert!(matches!(
            executor.run(&plan).await,
            Err(CutlineError::InvalidState { .. })
        ));
    }
}
