//! Mock implementations of core traits for testing.
//!
//! These are shared across crates so unit and integration tests can drive the
//! orchestrator through every remote and persistence outcome.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::{
    traits::{AvailabilityProbe, InteractionFilter, InteractionStore, RemoteAnalysis, StoreEvent},
    types::{AnalysisRequest, Feedback, Interaction, RemoteReport},
    Error, Result,
};

// =============================================================================
// Mock Remote Analysis
// =============================================================================

/// Scripted outcome for one remote call.
#[derive(Debug, Clone)]
pub enum RemoteScript {
    /// Return this report.
    Report(RemoteReport),
    /// Fail as if the service were unreachable.
    Unavailable,
    /// Fail as if the payload could not be mapped.
    Malformed,
    /// Sleep for this long before answering with an empty report.
    Hang(Duration),
}

/// Scripted mock of the remote analysis service.
///
/// Scripts are consumed in order; the last one repeats once the queue drains.
pub struct MockRemoteAnalysis {
    scripts: Mutex<VecDeque<RemoteScript>>,
    last: Mutex<RemoteScript>,
    call_count: AtomicUsize,
}

impl MockRemoteAnalysis {
    /// Create a mock with a queue of outcomes.
    pub fn new(scripts: Vec<RemoteScript>) -> Self {
        let last = scripts
            .last()
            .cloned()
            .unwrap_or(RemoteScript::Report(RemoteReport::default()));
        Self {
            scripts: Mutex::new(scripts.into()),
            last: Mutex::new(last),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Always return the same report.
    pub fn constant(report: RemoteReport) -> Self {
        Self::new(vec![RemoteScript::Report(report)])
    }

    /// Always fail with `RemoteUnavailable`.
    pub fn unavailable() -> Self {
        Self::new(vec![RemoteScript::Unavailable])
    }

    /// Number of `analyze` calls made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn next_script(&self) -> RemoteScript {
        let mut queue = self.scripts.lock().unwrap();
        match queue.pop_front() {
            Some(script) => {
                *self.last.lock().unwrap() = script.clone();
                script
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

#[async_trait]
impl RemoteAnalysis for MockRemoteAnalysis {
    async fn analyze(&self, _request: &AnalysisRequest) -> Result<RemoteReport> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.next_script() {
            RemoteScript::Report(report) => Ok(report),
            RemoteScript::Unavailable => Err(Error::remote_unavailable("mock: connection refused")),
            RemoteScript::Malformed => Err(Error::malformed("mock: missing violations field")),
            RemoteScript::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(RemoteReport::default())
            }
        }
    }
}

// =============================================================================
// Mock Availability Probe
// =============================================================================

/// Probe whose answer is set by the test.
pub struct StaticProbe {
    available: AtomicBool,
    probe_count: AtomicUsize,
}

impl StaticProbe {
    pub fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
            probe_count: AtomicUsize::new(0),
        }
    }

    /// Change the answer returned by later probes.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of probes performed.
    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvailabilityProbe for StaticProbe {
    async fn is_remote_available(&self) -> bool {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        self.available.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Failing Store
// =============================================================================

/// Store whose writes always fail. Used to check that persistence failures
/// never change a governance decision.
pub struct FailingInteractionStore {
    attempts: AtomicUsize,
    events: broadcast::Sender<StoreEvent>,
}

impl FailingInteractionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            attempts: AtomicUsize::new(0),
            events,
        }
    }

    /// Number of write attempts seen.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for FailingInteractionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InteractionStore for FailingInteractionStore {
    async fn save(&self, _interaction: &Interaction) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::persistence("mock: storage offline"))
    }

    async fn save_feedback(&self, _interaction_id: &str, _feedback: &Feedback) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::persistence("mock: storage offline"))
    }

    async fn list(&self, _filter: InteractionFilter) -> Result<Vec<Interaction>> {
        Err(Error::persistence("mock: storage offline"))
    }

    async fn get_by_id(&self, _interaction_id: &str) -> Result<Option<Interaction>> {
        Err(Error::persistence("mock: storage offline"))
    }

    async fn resolve_violation(&self, _interaction_id: &str, _index: usize) -> Result<bool> {
        Err(Error::persistence("mock: storage offline"))
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
