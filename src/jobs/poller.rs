//! Async Job Poller
//!
//! Drives a submitted control-plane job to a terminal state. The status is
//! checked first and the poll interval is slept between attempts, so a job
//! with `max_attempts = n` costs at most `n` status calls and `n - 1` waits.

use crate::controlplane::client::wire::JobStatusWire;
use crate::domain::model::{AsyncJob, JobState};
use crate::domain::ports::{ApiRequest, ControlPlaneTransportRef};
use crate::error::{Error, Result};
use crate::metrics::WorkflowMetrics;
use tracing::{debug, info, warn};
use urlencoding::encode;

/// Path of the job status endpoint
const ACTIVE_TASK_PATH: &str = "/occm/api/audit/activeTask";

pub struct JobPoller {
    transport: ControlPlaneTransportRef,
    metrics: Option<WorkflowMetrics>,
}

impl JobPoller {
    pub fn new(transport: ControlPlaneTransportRef) -> Self {
        Self {
            transport,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: WorkflowMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Wait for `job` to succeed, returning the number of polls it took
    pub async fn wait(&self, job: &AsyncJob) -> Result<u32> {
        let operation = job.operation();
        if job.max_attempts == 0 {
            return Err(Error::Configuration(format!(
                "job {} for {} allows no status polls",
                job.request_id, operation
            )));
        }

        for attempt in 1..=job.max_attempts {
            let state = self.status(job, &operation).await?;
            debug!(
                request_id = %job.request_id,
                attempt,
                max_attempts = job.max_attempts,
                "Job state: {:?}",
                state
            );

            match state {
                JobState::Succeeded => {
                    info!(
                        "Job {} for {} succeeded after {} attempt(s)",
                        job.request_id, operation, attempt
                    );
                    return Ok(attempt);
                }
                JobState::Failed { reason } => {
                    warn!("Job {} for {} failed: {}", job.request_id, operation, reason);
                    return Err(Error::JobFailed {
                        operation,
                        request_id: job.request_id.clone(),
                        reason,
                    });
                }
                JobState::InProgress if attempt < job.max_attempts => {
                    tokio::time::sleep(job.poll_interval).await;
                }
                JobState::InProgress => {}
            }
        }

        warn!(
            "Job {} for {} still running after {} attempts",
            job.request_id, operation, job.max_attempts
        );
        Err(Error::JobTimedOut {
            operation,
            request_id: job.request_id.clone(),
            attempts: job.max_attempts,
        })
    }

    async fn status(&self, job: &AsyncJob, operation: &str) -> Result<JobState> {
        if let Some(metrics) = &self.metrics {
            metrics.record_poll();
        }

        let path = format!("{}/{}", ACTIVE_TASK_PATH, encode(&job.request_id));
        let response = self
            .transport
            .call(ApiRequest::get(path))
            .await?
            .ensure_success(operation)?;

        response
            .json::<JobStatusWire>(operation)?
            .into_state(operation, response.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ApiResponse, HttpMethod};
    use crate::testing::{self, FakeControlPlane};
    use assert_matches::assert_matches;
    use prometheus::Registry;
    use std::sync::Arc;
    use std::time::Duration;

    const STATUS_PATH: &str = "/occm/api/audit/activeTask/req-1";

    fn job(max_attempts: u32) -> AsyncJob {
        AsyncJob {
            request_id: "req-1".into(),
            kind: "replication".into(),
            action: "create".into(),
            poll_interval: Duration::ZERO,
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_in_progress() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on(HttpMethod::Get, STATUS_PATH, testing::job_status(0, None))
            .on(HttpMethod::Get, STATUS_PATH, testing::job_status(0, None))
            .on(HttpMethod::Get, STATUS_PATH, testing::job_status(1, None));

        let attempts = JobPoller::new(fake.clone()).wait(&job(10)).await.unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(fake.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_times_out_after_max_attempts() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on(HttpMethod::Get, STATUS_PATH, testing::job_status(0, None));

        let result = JobPoller::new(fake.clone()).wait(&job(3)).await;
        assert_matches!(result, Err(Error::JobTimedOut { attempts: 3, .. }));
        assert_eq!(fake.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_is_rejected_without_polling() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on(HttpMethod::Get, STATUS_PATH, testing::job_status(1, None));

        let result = JobPoller::new(fake.clone()).wait(&job(0)).await;
        assert_matches!(result, Err(Error::Configuration(_)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_carries_diagnostic() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on(
            HttpMethod::Get,
            STATUS_PATH,
            testing::job_status(-1, Some("destination aggregate is full")),
        );

        let result = JobPoller::new(fake.clone()).wait(&job(10)).await;
        assert_matches!(
            result,
            Err(Error::JobFailed { ref reason, ref operation, .. })
                if reason == "destination aggregate is full" && operation == "create replication"
        );
    }

    #[tokio::test]
    async fn test_unknown_status_is_rejected() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on(HttpMethod::Get, STATUS_PATH, testing::job_status(7, None));

        let result = JobPoller::new(fake.clone()).wait(&job(10)).await;
        assert_matches!(result, Err(Error::RemoteValidation { .. }));
    }

    #[tokio::test]
    async fn test_status_endpoint_error_aborts() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on(
            HttpMethod::Get,
            STATUS_PATH,
            ApiResponse::new(503, r#"{"message":"maintenance"}"#),
        );

        let result = JobPoller::new(fake.clone()).wait(&job(10)).await;
        assert_matches!(result, Err(Error::RemoteServer { status: 503, .. }));
        assert_eq!(fake.calls().len(), 1);
    }

    #[test]
    fn test_polls_are_counted() {
        let registry = Registry::new();
        let metrics = WorkflowMetrics::register(&registry).unwrap();
        let fake = Arc::new(FakeControlPlane::new());
        fake.on(HttpMethod::Get, STATUS_PATH, testing::job_status(0, None))
            .on(HttpMethod::Get, STATUS_PATH, testing::job_status(1, None));

        let poller = JobPoller::new(fake.clone()).with_metrics(metrics.clone());
        tokio_test::block_on(poller.wait(&job(5))).unwrap();
        assert_eq!(metrics.poll_count(), 2);
    }
}
