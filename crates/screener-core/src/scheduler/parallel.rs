use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::capture::CaptureResult;
use crate::config::ScreenerConfig;
use crate::error::CaptureError;
use crate::screener::Screener;

/// How targets are handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// Pipelines in flight at once; 0 is treated as 1.
    pub concurrency: usize,
    /// Pause between starting consecutive targets.
    pub delay_between: Duration,
}

impl From<usize> for Dispatch {
    fn from(concurrency: usize) -> Self {
        Self {
            concurrency,
            delay_between: Duration::ZERO,
        }
    }
}

impl From<&ScreenerConfig> for Dispatch {
    fn from(cfg: &ScreenerConfig) -> Self {
        Self {
            concurrency: cfg.concurrency,
            delay_between: cfg.delay_between(),
        }
    }
}

/// Runs every target and returns the results in completion order.
pub async fn run_all(
    screener: Arc<Screener>,
    targets: Vec<String>,
    dispatch: impl Into<Dispatch>,
) -> Vec<CaptureResult> {
    let expected = targets.len();
    let mut rx = run_streaming(screener, targets, dispatch);
    let mut results = Vec::with_capacity(expected);
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    results
}

/// Streams results as they complete. The channel closes once every target
/// has been submitted and every pipeline has finished.
pub fn run_streaming(
    screener: Arc<Screener>,
    targets: Vec<String>,
    dispatch: impl Into<Dispatch>,
) -> mpsc::Receiver<CaptureResult> {
    let dispatch = dispatch.into();
    let max_concurrent = dispatch.concurrency.max(1);
    let (tx, rx) = mpsc::channel(max_concurrent * 2);
    tokio::spawn(drive(screener, targets, max_concurrent, dispatch.delay_between, tx));
    rx
}

async fn drive(
    screener: Arc<Screener>,
    targets: Vec<String>,
    max_concurrent: usize,
    delay_between: Duration,
    tx: mpsc::Sender<CaptureResult>,
) {
    let total = targets.len();
    let mut queue = targets.into_iter();
    let mut join_set = JoinSet::new();
    let mut started = 0usize;

    loop {
        while join_set.len() < max_concurrent {
            let Some(target) = queue.next() else {
                break;
            };
            if started > 0 && !delay_between.is_zero() {
                tokio::time::sleep(delay_between).await;
            }
            started += 1;
            tracing::debug!(input = %target, started, total, "dispatching target");
            join_set.spawn(run_isolated(Arc::clone(&screener), target));
        }

        if join_set.is_empty() {
            break;
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok(result) => {
                // A closed receiver means nobody is listening; keep draining
                // so in-flight pipelines still finish cleanly.
                let _ = tx.send(result).await;
            }
            Err(e) => tracing::error!(error = %e, "scheduler task join failed"),
        }
    }
    tracing::debug!(total, "all targets finished");
}

/// Runs one pipeline in its own task so a panic is reported as that
/// target's failure instead of tearing down the run.
async fn run_isolated(screener: Arc<Screener>, target: String) -> CaptureResult {
    let inner = {
        let target = target.clone();
        tokio::spawn(async move { screener.process(&target).await })
    };
    match inner.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(input = %target, error = %e, "capture pipeline panicked");
            let err = CaptureError::Navigation {
                url: target.clone(),
                detail: format!("capture pipeline panicked: {e}"),
            };
            CaptureResult::failed(&target, None, err)
        }
    }
}
