//! Provider test doubles

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ProviderError;
use crate::providers::{
    DeferredReason, PlanActionRequest, PlanActionResponse, ProviderClient, ProviderFactory,
};
use invoke_addrs::AbsProviderConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

type Responder = Box<dyn Fn(&PlanActionRequest) -> PlanActionResponse + Send + Sync>;

/// Provider client that records every plan request
///
/// Responses come from a responder closure; the default accepts everything.
pub struct RecordingProvider {
    responder: Responder,
    delay: Option<Duration>,
    calls: Mutex<Vec<PlanActionRequest>>,
}

impl std::fmt::Debug for RecordingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingProvider")
            .field("delay", &self.delay)
            .field("calls", &self.calls.lock().len())
            .finish_non_exhaustive()
    }
}

impl Default for RecordingProvider {
    fn default() -> Self {
        Self::accepting()
    }
}

impl RecordingProvider {
    /// Answer every request with `responder`
    pub fn new(
        responder: impl Fn(&PlanActionRequest) -> PlanActionResponse + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Accept every request
    #[must_use]
    pub fn accepting() -> Self {
        Self::new(|_| PlanActionResponse::ok())
    }

    /// Defer every request
    #[must_use]
    pub fn deferring(reason: DeferredReason) -> Self {
        Self::new(move |_| PlanActionResponse::deferred(reason))
    }

    /// Reject every request with one error
    #[must_use]
    pub fn failing(summary: &'static str) -> Self {
        Self::new(move |_| {
            PlanActionResponse::with_diagnostics(Diagnostic::error(summary, "Rejected by provider.").into())
        })
    }

    /// Wait `delay` before answering
    #[inline]
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    #[must_use]
    pub fn calls(&self) -> Vec<PlanActionRequest> {
        self.calls.lock().clone()
    }

    /// Number of requests received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Whether any request arrived
    #[must_use]
    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }
}

#[async_trait::async_trait]
impl ProviderClient for RecordingProvider {
    async fn plan_action(&self, request: PlanActionRequest) -> PlanActionResponse {
        self.calls.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(&request)
    }
}

/// Factory whose provider never starts
#[must_use]
pub fn unavailable_factory(reason: &'static str) -> ProviderFactory {
    Arc::new(
        move |addr: &AbsProviderConfig| -> Result<Arc<dyn ProviderClient>, ProviderError> {
            Err(ProviderError::Unavailable {
                addr: addr.to_string(),
                reason: reason.to_string(),
            })
        },
    )
}

/// Response carrying one provider error
#[must_use]
pub fn provider_error(summary: &str, detail: &str) -> PlanActionResponse {
    PlanActionResponse::with_diagnostics(Diagnostics::from(Diagnostic::error(summary, detail)))
}
