//! Attempt observers
//!
//! Observers receive attempt-level events from the execution engine. They are
//! purely informational: nothing an observer does can change which credential
//! is tried next or what the engine returns.

use std::fmt;
use std::sync::{Arc, Mutex};

// ============================================================================
// Events
// ============================================================================

/// Attempt-level event emitted by the engine
///
/// Indexes are 1-based. Credentials are always masked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptEvent {
    AttemptStarted {
        index: usize,
        total: usize,
        credential: String,
    },
    AttemptSucceeded {
        index: usize,
    },
    AttemptFailedRetryable {
        index: usize,
    },
    AttemptFailedFatal {
        index: usize,
    },
    AllAttemptsExhausted {
        total: usize,
    },
}

impl fmt::Display for AttemptEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttemptStarted {
                index,
                total,
                credential,
            } => write!(f, "Trying API key {}/{}: {}", index, total, credential),
            Self::AttemptSucceeded { index } => write!(f, "✓ Success with API key {}", index),
            Self::AttemptFailedRetryable { index } => {
                write!(f, "✗ Retryable failure with API key {}, switching...", index)
            }
            Self::AttemptFailedFatal { index } => {
                write!(f, "✗ Non-retryable error with API key {}, giving up", index)
            }
            Self::AllAttemptsExhausted { total } => write!(f, "✗ All {} API keys failed", total),
        }
    }
}

// ============================================================================
// Observer Trait
// ============================================================================

/// Sink for attempt events
pub trait AttemptObserver: Send + Sync {
    fn on_event(&self, event: &AttemptEvent);
}

impl<F> AttemptObserver for F
where
    F: Fn(&AttemptEvent) + Send + Sync,
{
    fn on_event(&self, event: &AttemptEvent) {
        self(event)
    }
}

// ============================================================================
// Tracing Observer
// ============================================================================

/// Forwards attempt events to `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingObserver {
    target: Option<String>,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label events with the name of the configured target
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
        }
    }

    fn target(&self) -> &str {
        self.target.as_deref().unwrap_or("-")
    }
}

impl AttemptObserver for TracingObserver {
    fn on_event(&self, event: &AttemptEvent) {
        let target = self.target();
        match event {
            AttemptEvent::AttemptStarted {
                index,
                total,
                credential,
            } => tracing::info!(
                target_name = %target,
                attempt = index,
                total = total,
                credential = %credential,
                "Trying API key"
            ),
            AttemptEvent::AttemptSucceeded { index } => {
                tracing::info!(target_name = %target, attempt = index, "API key succeeded")
            }
            AttemptEvent::AttemptFailedRetryable { index } => tracing::warn!(
                target_name = %target,
                attempt = index,
                "Retryable failure, switching to next API key"
            ),
            AttemptEvent::AttemptFailedFatal { index } => tracing::warn!(
                target_name = %target,
                attempt = index,
                "Fatal failure, remaining API keys skipped"
            ),
            AttemptEvent::AllAttemptsExhausted { total } => {
                tracing::warn!(target_name = %target, total = total, "All API keys failed")
            }
        }
    }
}

// ============================================================================
// Console Observer
// ============================================================================

/// Prints switching progress to stdout, one line per event
///
/// Shares stdout with the results printed by the caller so the two stay in order.
#[derive(Debug, Clone)]
pub struct ConsoleObserver {
    prefix: String,
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new("[rotator]")
    }
}

impl ConsoleObserver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Render the line printed for an event
    pub fn format_event(&self, event: &AttemptEvent) -> String {
        format!("{} {}", self.prefix, event)
    }
}

impl AttemptObserver for ConsoleObserver {
    fn on_event(&self, event: &AttemptEvent) {
        if matches!(event, AttemptEvent::AttemptStarted { .. }) {
            println!();
        }
        println!("{}", self.format_event(event));
    }
}

// ============================================================================
// Observer Set
// ============================================================================

/// Forwards every event to each of its observers, in the order they were added
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn AttemptObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observer: impl AttemptObserver + 'static) {
        self.observers.push(Arc::new(observer));
    }

    pub fn with(mut self, observer: impl AttemptObserver + 'static) -> Self {
        self.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl AttemptObserver for ObserverSet {
    fn on_event(&self, event: &AttemptEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

// ============================================================================
// Recording Observer
// ============================================================================

/// Keeps every event in memory; cloned handles share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<AttemptEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<AttemptEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl AttemptObserver for RecordingObserver {
    fn on_event(&self, event: &AttemptEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
