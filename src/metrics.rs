//! Workflow metrics
//!
//! Prometheus instruments for create, read and delete outcomes and for job
//! polling. Registered into a caller-owned registry so tests and embedders do
//! not share the process-global one.

use crate::error::{Error, Result};
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};
use std::time::Duration;

/// Outcome label of a finished workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Instruments shared by the orchestrator and the job poller
#[derive(Clone)]
pub struct WorkflowMetrics {
    workflows: IntCounterVec,
    duration: HistogramVec,
    poll_attempts: IntCounter,
}

impl WorkflowMetrics {
    /// Create and register the instruments
    pub fn register(registry: &Registry) -> Result<Self> {
        let workflows = IntCounterVec::new(
            Opts::new(
                "replication_workflows_total",
                "Replication workflows by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .map_err(metrics_error)?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                "replication_workflow_duration_seconds",
                "Duration of replication workflows",
            )
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
            &["operation"],
        )
        .map_err(metrics_error)?;

        let poll_attempts = IntCounter::new(
            "replication_job_poll_attempts_total",
            "Job status polls issued against the control plane",
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(workflows.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(duration.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(poll_attempts.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            workflows,
            duration,
            poll_attempts,
        })
    }

    /// Record a finished workflow
    pub fn observe(&self, operation: &str, outcome: Outcome, elapsed: Duration) {
        self.workflows
            .with_label_values(&[operation, outcome.as_str()])
            .inc();
        self.duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_poll(&self) {
        self.poll_attempts.inc();
    }

    pub fn workflow_count(&self, operation: &str, outcome: Outcome) -> u64 {
        self.workflows
            .with_label_values(&[operation, outcome.as_str()])
            .get()
    }

    pub fn poll_count(&self) -> u64 {
        self.poll_attempts.get()
    }
}

fn metrics_error(err: prometheus::Error) -> Error {
    Error::Internal(format!("metrics registration failed: {}", err))
}

/// Render a registry in the text exposition format
pub fn render(registry: &Registry) -> Result<String> {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(metrics_error)?;
    String::from_utf8(buffer).map_err(|e| Error::Internal(format!("metrics not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_and_render() {
        let registry = Registry::new();
        let metrics = WorkflowMetrics::register(&registry).unwrap();

        metrics.observe("create", Outcome::Success, Duration::from_secs(3));
        metrics.observe("create", Outcome::Failure, Duration::from_secs(1));
        metrics.record_poll();
        metrics.record_poll();

        assert_eq!(metrics.workflow_count("create", Outcome::Success), 1);
        assert_eq!(metrics.workflow_count("create", Outcome::Failure), 1);
        assert_eq!(metrics.workflow_count("delete", Outcome::Success), 0);
        assert_eq!(metrics.poll_count(), 2);

        let text = render(&registry).unwrap();
        assert!(text.contains("replication_workflows_total"));
        assert!(text.contains("replication_job_poll_attempts_total 2"));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        WorkflowMetrics::register(&registry).unwrap();
        assert!(WorkflowMetrics::register(&registry).is_err());
    }
}
