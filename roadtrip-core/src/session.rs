//! Request sequencing between the pipeline and whatever displays its plans.
//!
//! A [`PlanSession`] owns the render sink. Every submission receives a fresh
//! [`RequestId`]; a finished plan reaches the sink only if no newer submission
//! has been issued in the meantime, so a slow old request can never overwrite
//! the result of a fast new one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{Instrument, debug, info_span};

use crate::error::PlanError;
use crate::model::RoutePlan;
use crate::pipeline::RoutePlanPipeline;

/// Consumer of finished plans, e.g. a terminal table or a map layer.
pub trait RenderSink: Send {
    fn render(&mut self, plan: &RoutePlan);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of request ids.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue an id newer than every id issued before it.
    pub fn issue(&self) -> RequestId {
        RequestId(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.latest.load(Ordering::SeqCst) == id.0
    }
}

/// What happened to one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// The plan was handed to the sink.
    Rendered(RoutePlan),
    /// A newer submission was issued before this one finished; its result,
    /// success or failure, was dropped.
    Superseded { request_id: RequestId },
}

pub struct PlanSession<S> {
    pipeline: RoutePlanPipeline,
    tracker: RequestTracker,
    sink: Mutex<S>,
}

impl<S: RenderSink> PlanSession<S> {
    pub fn new(pipeline: RoutePlanPipeline, sink: S) -> Self {
        Self {
            pipeline,
            tracker: RequestTracker::new(),
            sink: Mutex::new(sink),
        }
    }

    /// Run one plan request under latest-request-wins.
    ///
    /// Errors are returned only for the latest request; a stale failure is
    /// reported as [`PlanOutcome::Superseded`] like a stale success.
    pub async fn submit(
        &self,
        origin_text: &str,
        destination_text: &str,
        departure: DateTime<Utc>,
    ) -> Result<PlanOutcome, PlanError> {
        let request_id = self.tracker.issue();
        let span = info_span!("plan_request", request_id = request_id.get());

        async move {
            let result = self
                .pipeline
                .plan(origin_text, destination_text, departure)
                .await;

            let mut sink = self.sink.lock().await;
            if !self.tracker.is_current(request_id) {
                debug!(%request_id, ok = result.is_ok(), "discarding stale result");
                return Ok(PlanOutcome::Superseded { request_id });
            }

            let plan = result?;
            sink.render(&plan);
            Ok(PlanOutcome::Rendered(plan))
        }
        .instrument(span)
        .await
    }

    pub fn into_sink(self) -> S {
        self.sink.into_inner()
    }
}

impl<S> fmt::Debug for PlanSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanSession")
            .field("pipeline", &self.pipeline)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}
