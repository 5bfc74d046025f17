//! Dispatch routine: one invocation per received or explicitly pulled job.
//!
//! Status transitions for a request are emitted sequentially inside one
//! dispatch task, so `Received` always precedes `Processing`, which precedes
//! the terminal status, which precedes any `Redirected` annotation. Redirect
//! evaluation runs after every terminal status and never after `Received`,
//! `Processing`, or `Redirected` itself.

use crate::error::{DispatchError, Result};
use crate::events::ListenerEvent;
use crate::jobs::{
    JobHandler, JobRequest, JobStatus, ProcessingError, ProcessingRequest, StatusKind,
};
use crate::listener::ListenerInner;
use crate::messaging::{Message, ReceivedJob};
use crate::status::StatusSink;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

impl ListenerInner {
    /// Dispatch one received job
    ///
    /// With `process_events` set (the event-driven path), every outcome is
    /// resolved to statuses and events and the call returns `Ok`. Without it
    /// (direct invocation), processing failures are re-raised to the caller
    /// and the failure lifecycle events are suppressed; statuses are written
    /// either way.
    pub(crate) async fn dispatch(&self, job: ReceivedJob, process_events: bool) -> Result<()> {
        match job {
            ReceivedJob::Decoded(request) => self.dispatch_request(request, process_events).await,
            ReceivedJob::Malformed {
                job_id,
                name,
                queue_id,
                queue_name,
                error,
            } => {
                // The message identity is known even though the body never
                // decoded; report the failure against it. There is no
                // decoded payload to re-send, so no redirect evaluation.
                let request = ProcessingRequest {
                    job_id,
                    name,
                    queue_id,
                    queue_name,
                    job_request: JobRequest::new("", None),
                };
                self.write_status(&request, StatusKind::Received, None, false, None)
                    .await;
                error!(job_id = %request.job_id, queue_id = %request.queue_id, %error, "received message could not be decoded");
                self.write_status(
                    &request,
                    StatusKind::Failed,
                    Some(error.clone()),
                    false,
                    None,
                )
                .await;
                if process_events {
                    self.events
                        .publish(ListenerEvent::ProcessingFailed { request, error });
                }
                Ok(())
            }
        }
    }

    async fn dispatch_request(
        &self,
        request: ProcessingRequest,
        process_events: bool,
    ) -> Result<()> {
        self.write_status(&request, StatusKind::Received, None, false, None)
            .await;

        if self.cancel_processing.load(Ordering::SeqCst) {
            self.write_status(&request, StatusKind::Canceled, None, true, None)
                .await;
            return Ok(());
        }

        let handler = match self.registry.handler_by_queue_id(&request.queue_id) {
            Some(handler) => handler,
            None => {
                self.write_status(
                    &request,
                    StatusKind::Skipped,
                    Some(format!("no handler found for {request}")),
                    true,
                    None,
                )
                .await;
                return Ok(());
            }
        };

        if !handler.can_process(&request) {
            self.write_status(
                &request,
                StatusKind::Skipped,
                Some(format!("no handler could process request '{request}'")),
                true,
                None,
            )
            .await;
            return Ok(());
        }

        self.write_status(&request, StatusKind::Processing, None, false, None)
            .await;

        match self.run_handler(handler.as_ref(), &request).await {
            Ok(result_body) => {
                self.write_status(
                    &request,
                    StatusKind::Complete,
                    result_body.clone(),
                    true,
                    None,
                )
                .await;
                self.events.publish(ListenerEvent::ProcessingCompleted {
                    request,
                    result_body,
                });
                Ok(())
            }
            Err(processing_error) => {
                let timed_out = matches!(processing_error, ProcessingError::Canceled(_));
                let kind = if timed_out {
                    StatusKind::TimedOut
                } else {
                    StatusKind::Failed
                };
                self.write_status(
                    &request,
                    kind,
                    Some(processing_error.to_string()),
                    true,
                    Some(&processing_error),
                )
                .await;

                if process_events {
                    let error = processing_error.to_string();
                    let event = if timed_out {
                        ListenerEvent::ProcessingTimedOut { request, error }
                    } else {
                        ListenerEvent::ProcessingFailed { request, error }
                    };
                    self.events.publish(event);
                    Ok(())
                } else {
                    Err(DispatchError::Processing(processing_error))
                }
            }
        }
    }

    /// Run the handler under the configured job timeout with a fresh
    /// cancellation signal
    async fn run_handler(
        &self,
        handler: &dyn JobHandler,
        request: &ProcessingRequest,
    ) -> std::result::Result<Option<String>, ProcessingError> {
        let cancellation = CancellationToken::new();

        match self.config.job_timeout() {
            Some(limit) => {
                match tokio::time::timeout(limit, handler.process(request, cancellation.clone()))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_elapsed) => {
                        // the in-flight future is already dropped; the token
                        // reaches anything the handler spawned
                        cancellation.cancel();
                        Err(ProcessingError::canceled(format!(
                            "job exceeded the {}ms timeout",
                            self.config.job_timeout_ms
                        )))
                    }
                }
            }
            None => handler.process(request, cancellation).await,
        }
    }

    /// Write one status transition: sinks first, then the status event,
    /// then redirect evaluation when requested
    pub(crate) async fn write_status(
        &self,
        request: &ProcessingRequest,
        kind: StatusKind,
        details: Option<String>,
        issue_redirect: bool,
        processing_error: Option<&ProcessingError>,
    ) {
        let status = JobStatus::for_request(request, kind, details);
        self.emit_status(&status).await;

        if issue_redirect {
            self.evaluate_redirect(&status, request, processing_error)
                .await;
        }
    }

    async fn emit_status(&self, status: &JobStatus) {
        let sinks: Vec<Arc<dyn StatusSink>> = self.status_sinks.read().clone();
        for sink in sinks {
            if let Err(sink_error) = sink.write_status(status).await {
                error!(
                    job_id = %status.job_id,
                    status = %status.status,
                    %sink_error,
                    "error recording status"
                );
            }
        }

        self.events.publish(ListenerEvent::StatusReported {
            status: status.clone(),
        });
    }

    /// Evaluate the queue's redirect strategy for a terminal status and
    /// re-send the job when it fires
    async fn evaluate_redirect(
        &self,
        status: &JobStatus,
        request: &ProcessingRequest,
        processing_error: Option<&ProcessingError>,
    ) {
        let strategy = match self.redirects.get(&request.queue_id) {
            Some(entry) => entry.value().clone(),
            None => return,
        };

        if !strategy.decide(status, processing_error) {
            return;
        }

        let target = match strategy
            .target_queue(status)
            .filter(|queue_id| !queue_id.trim().is_empty())
        {
            Some(target) => target,
            None => return,
        };

        match self.redirect_to(&target, request).await {
            Ok(new_message) => {
                debug!(
                    job_id = %request.job_id,
                    from_queue = %request.queue_id,
                    to_queue = %target,
                    new_message_id = %new_message.id,
                    "request redirected"
                );
                let redirected = JobStatus::for_request(
                    request,
                    StatusKind::Redirected,
                    Some(format!(
                        "new queue: {target}, message id: {}",
                        new_message.id
                    )),
                );
                self.emit_status(&redirected).await;
                self.events.publish(ListenerEvent::RequestRedirected {
                    from_queue: request.queue_id.clone(),
                    to_queue: target,
                    new_message,
                });
            }
            Err(redirect_error) => {
                error!(
                    job_id = %request.job_id,
                    from_queue = %request.queue_id,
                    to_queue = %target,
                    %redirect_error,
                    "failed to redirect request"
                );
            }
        }
    }

    /// Send a new job carrying the original request body to the target queue
    async fn redirect_to(&self, target: &str, request: &ProcessingRequest) -> Result<Message> {
        self.queue(target)?
            .send_request(&request.job_request, &request.name)
            .await
    }
}
