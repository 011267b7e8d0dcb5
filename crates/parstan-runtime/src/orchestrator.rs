use crate::config::{RunConfig, ensure_scratch_dir};
use crate::discovery::collect_files;
use crate::Result;
use crate::worker::WorkerProcess;
use parstan_engine::{ProgressTracker, ReportBuilder, parse_worker_output, partition};
use parstan_types::{AnalysisReport, Chunk, GlobalError, WorkerResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receives combined progress while workers run.
pub trait ProgressSink {
    fn start(&mut self, total: usize);
    fn advance(&mut self, step: usize);
    fn finish(&mut self);
}

/// Sink for runs without a progress display.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&mut self, _total: usize) {}
    fn advance(&mut self, _step: usize) {}
    fn finish(&mut self) {}
}

/// Shared flag that asks a running orchestrator to stop.
#[derive(Debug, Default, Clone)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Partitioned,
    Spawned,
    Polling,
    Drained,
}

/// Worker results of one run, in chunk order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub results: Vec<WorkerResult>,
    /// Workers that were still running when the run was cancelled
    pub unfinished: usize,
    pub workers: usize,
}

pub struct Orchestrator<'a> {
    config: &'a RunConfig,
    cancel: CancelToken,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a RunConfig, cancel: CancelToken) -> Self {
        Self { config, cancel }
    }

    /// Run one worker per chunk until every worker has terminated (or the run is cancelled).
    ///
    /// Results land in a slot addressed by chunk index, so the returned order never depends
    /// on which worker finished first.
    pub fn run(
        &self,
        chunks: Vec<Chunk>,
        total_files: usize,
        sink: &mut dyn ProgressSink,
    ) -> RunOutcome {
        let workers = chunks.len();
        log_state(RunState::Partitioned, workers);
        if chunks.is_empty() {
            log_state(RunState::Drained, 0);
            return RunOutcome::default();
        }

        let mut slots: Vec<Option<WorkerResult>> = vec![None; workers];
        let mut tracker = ProgressTracker::new(total_files);
        let mut tracked: Vec<WorkerProcess> = Vec::with_capacity(workers);

        sink.start(total_files);
        for chunk in &chunks {
            match WorkerProcess::spawn(chunk, self.config) {
                Ok(worker) => {
                    tracker.register(chunk.index(), chunk.len());
                    tracked.push(worker);
                }
                Err(err) => {
                    tracing::warn!("{}", err);
                    slots[chunk.index()] = Some(WorkerResult::failed(err.to_string()));
                }
            }
        }
        log_state(RunState::Spawned, tracked.len());

        log_state(RunState::Polling, tracked.len());
        let mut cancelled = false;
        while !tracked.is_empty() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                tracing::info!(remaining = tracked.len(), "run cancelled, stopping workers");
                for mut worker in tracked.drain(..) {
                    worker.kill();
                    let _ = worker.collect_final_output();
                }
                break;
            }

            let mut position = 0;
            while position < tracked.len() {
                let worker = &mut tracked[position];
                feed_progress(&mut tracker, sink, worker);
                if worker.is_running() {
                    position += 1;
                    continue;
                }

                let mut worker = tracked.remove(position);
                worker.drain_streams();
                feed_progress(&mut tracker, sink, &mut worker);
                tracker.retire(worker.index());

                let index = worker.index();
                let output = worker.collect_final_output();
                let result = parse_worker_output(&output);
                if result.success {
                    tracing::debug!(
                        worker = index,
                        exit_code = ?output.exit_code,
                        findings = result.file_findings.len(),
                        "worker finished"
                    );
                } else {
                    tracing::warn!(
                        worker = index,
                        exit_code = ?output.exit_code,
                        "worker produced unusable output"
                    );
                }
                slots[index] = Some(result);
            }

            if !tracked.is_empty() {
                std::thread::sleep(self.config.poll_interval);
            }
        }

        // Every file of a drained run was handled, even by workers that never reported progress.
        let unreported = tracker.total() - tracker.advanced();
        if !cancelled && unreported > 0 {
            sink.advance(unreported);
        }
        sink.finish();
        log_state(RunState::Drained, 0);

        let unfinished = slots.iter().filter(|slot| slot.is_none()).count();
        RunOutcome {
            results: slots.into_iter().flatten().collect(),
            unfinished,
            workers,
        }
    }
}

fn feed_progress(
    tracker: &mut ProgressTracker,
    sink: &mut dyn ProgressSink,
    worker: &mut WorkerProcess,
) {
    let fresh = worker.poll_incremental_stderr();
    if fresh.is_empty() {
        return;
    }

    let step = tracker.observe(worker.index(), &String::from_utf8_lossy(&fresh));
    if step > 0 {
        sink.advance(step);
    }
}

fn log_state(state: RunState, workers: usize) {
    tracing::debug!(state = ?state, workers, "run state");
}

/// Discover files, fan them out over workers and merge everything into one report.
///
/// Only setup problems are errors; anything that goes wrong inside a worker ends up in the
/// report instead.
pub fn analyse(
    config: &RunConfig,
    paths: &[PathBuf],
    sink: &mut dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<AnalysisReport> {
    config.validate()?;
    ensure_scratch_dir(&config.scratch_dir)?;

    let discovery = collect_files(paths, &config.working_dir, &config.extensions);
    let total_files = discovery.files.len();
    let chunks = partition(discovery.files, config.workers);
    tracing::info!(
        files = total_files,
        workers = chunks.len(),
        "starting analysis"
    );

    let outcome = Orchestrator::new(config, cancel.clone()).run(chunks, total_files, sink);

    let mut builder = ReportBuilder::new().with_findings(discovery.findings);
    builder.extend(outcome.results);
    if outcome.unfinished > 0 {
        builder.push_error(GlobalError::new(format!(
            "Analysis was interrupted before {} of {} workers finished",
            outcome.unfinished, outcome.workers
        )));
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_no_chunks_goes_straight_to_drained() {
        let config = RunConfig::from_settings(PathBuf::from("/nonexistent"), &Settings::default());
        let outcome =
            Orchestrator::new(&config, CancelToken::new()).run(Vec::new(), 0, &mut NoProgress);
        assert_eq!(outcome, RunOutcome::default());
    }
}
