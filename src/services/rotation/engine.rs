//! Credential-rotating execution engine
//!
//! Walks a [`CredentialPool`] in order, invoking the call once per credential
//! until one succeeds. A retryable failure moves on to the next credential, a
//! fatal failure stops immediately. When every credential fails retryably the
//! error from the last one is returned.
//!
//! The engine never waits on its own: there is no backoff between attempts,
//! and exactly one invocation is in flight at a time.

use super::invoker::CallInvoker;
use super::observer::{AttemptEvent, AttemptObserver};
use crate::error::{Classify, FailureKind};
use crate::services::key_pool::{Credential, CredentialPool, DEFAULT_MASK_PREFIX};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Attempt Records
// ============================================================================

/// How a single attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    FailedRetryable,
    FailedFatal,
}

/// One invocation made during an execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based position in the pool
    pub index: usize,
    /// Masked credential
    pub credential: String,
    pub outcome: AttemptOutcome,
}

/// Result of an execution together with the attempts that produced it
#[derive(Debug)]
pub struct ExecutionReport<T, E> {
    /// The first success, or the error of the last attempt made
    pub result: Result<T, E>,

    /// Attempts in the order they were made
    pub attempts: Vec<Attempt>,
}

impl<T, E> ExecutionReport<T, E> {
    /// Number of invocations performed
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

enum Step<T, E> {
    Done(Result<T, E>),
    Next(E),
}

// ============================================================================
// Execution Engine
// ============================================================================

/// Sequential credential fallback
///
/// Engines are plain values: build one, optionally attach an observer, and
/// pass it to whatever needs it. Cloning is cheap and clones share the
/// observer.
#[derive(Clone)]
pub struct ExecutionEngine {
    observer: Option<Arc<dyn AttemptObserver>>,
    mask_prefix: usize,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("observer", &self.observer.is_some())
            .field("mask_prefix", &self.mask_prefix)
            .finish()
    }
}

impl ExecutionEngine {
    /// Create a silent engine (no observer)
    pub fn new() -> Self {
        Self {
            observer: None,
            mask_prefix: DEFAULT_MASK_PREFIX,
        }
    }

    /// Attach an observer for attempt events
    pub fn with_observer(self, observer: impl AttemptObserver + 'static) -> Self {
        self.with_shared_observer(Arc::new(observer))
    }

    /// Attach an observer that is shared with other owners
    pub fn with_shared_observer(mut self, observer: Arc<dyn AttemptObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Set how many leading characters of a credential events may show
    pub fn with_mask_prefix(mut self, prefix_chars: usize) -> Self {
        self.mask_prefix = prefix_chars;
        self
    }

    pub fn mask_prefix(&self) -> usize {
        self.mask_prefix
    }

    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    /// Run `invoker` against each credential in `pool` until one succeeds
    ///
    /// Returns the first success, the first fatal error, or, when every
    /// credential failed retryably, the last credential's error.
    pub async fn execute<I>(
        &self,
        pool: &CredentialPool,
        invoker: &I,
    ) -> Result<I::Output, I::Error>
    where
        I: CallInvoker + ?Sized,
    {
        self.execute_with_report(pool, invoker).await.result
    }

    /// Same as [`execute`](Self::execute), also returning the attempt log
    pub async fn execute_with_report<I>(
        &self,
        pool: &CredentialPool,
        invoker: &I,
    ) -> ExecutionReport<I::Output, I::Error>
    where
        I: CallInvoker + ?Sized,
    {
        let total = pool.len();
        let mut attempts = Vec::with_capacity(total);

        let mut last_error = match self
            .attempt(invoker, pool.first(), 1, total, &mut attempts)
            .await
        {
            Step::Done(result) => return ExecutionReport { result, attempts },
            Step::Next(err) => err,
        };

        for (offset, credential) in pool.iter().enumerate().skip(1) {
            last_error = match self
                .attempt(invoker, credential, offset + 1, total, &mut attempts)
                .await
            {
                Step::Done(result) => return ExecutionReport { result, attempts },
                Step::Next(err) => err,
            };
        }

        self.emit(AttemptEvent::AllAttemptsExhausted { total });

        ExecutionReport {
            result: Err(last_error),
            attempts,
        }
    }

    async fn attempt<I>(
        &self,
        invoker: &I,
        credential: &Credential,
        index: usize,
        total: usize,
        attempts: &mut Vec<Attempt>,
    ) -> Step<I::Output, I::Error>
    where
        I: CallInvoker + ?Sized,
    {
        let masked = credential.masked(self.mask_prefix);
        self.emit(AttemptEvent::AttemptStarted {
            index,
            total,
            credential: masked.clone(),
        });

        let (step, outcome) = match invoker.invoke(credential).await {
            Ok(value) => {
                self.emit(AttemptEvent::AttemptSucceeded { index });
                (Step::Done(Ok(value)), AttemptOutcome::Succeeded)
            }
            Err(err) => match err.failure_kind() {
                FailureKind::Retryable => {
                    self.emit(AttemptEvent::AttemptFailedRetryable { index });
                    (Step::Next(err), AttemptOutcome::FailedRetryable)
                }
                FailureKind::Fatal => {
                    self.emit(AttemptEvent::AttemptFailedFatal { index });
                    (Step::Done(Err(err)), AttemptOutcome::FailedFatal)
                }
            },
        };

        attempts.push(Attempt {
            index,
            credential: masked,
            outcome,
        });
        step
    }

    fn emit(&self, event: AttemptEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Classified, PoolError};
    use crate::services::rotation::observer::RecordingObserver;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Reply {
        Ok(&'static str),
        Retryable(&'static str),
        Fatal(&'static str),
    }

    /// Answers per key from a fixed script and records every key it sees
    struct ScriptedInvoker {
        script: HashMap<&'static str, Reply>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedInvoker {
        fn new(script: &[(&'static str, Reply)]) -> Self {
            Self {
                script: script.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CallInvoker for ScriptedInvoker {
        type Output = String;
        type Error = Classified<String>;

        async fn invoke(&self, credential: &Credential) -> Result<String, Classified<String>> {
            let key = credential.expose();
            self.calls.lock().unwrap().push(key.to_string());
            match self.script.get(key) {
                Some(Reply::Ok(value)) => Ok(value.to_string()),
                Some(Reply::Retryable(msg)) => Err(Classified::retryable(msg.to_string())),
                Some(Reply::Fatal(msg)) => Err(Classified::fatal(msg.to_string())),
                None => Err(Classified::fatal(format!("unscripted key {}", key))),
            }
        }
    }

    fn pool(keys: &[&str]) -> CredentialPool {
        CredentialPool::normalize(keys).unwrap()
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let invoker = ScriptedInvoker::new(&[
            ("k1", Reply::Ok("first")),
            ("k2", Reply::Ok("second")),
        ]);

        let result = ExecutionEngine::new()
            .execute(&pool(&["k1", "k2"]), &invoker)
            .await;

        assert_eq!(result.unwrap(), "first");
        assert_eq!(invoker.calls(), vec!["k1"]);
    }

    #[tokio::test]
    async fn test_sequential_fallback_in_pool_order() {
        let invoker = ScriptedInvoker::new(&[
            ("k1", Reply::Retryable("429 k1")),
            ("k2", Reply::Retryable("429 k2")),
            ("k3", Reply::Ok("ok")),
            ("k4", Reply::Ok("never")),
        ]);

        let result = ExecutionEngine::new()
            .execute(&pool(&["k1", "k2", "k3", "k4"]), &invoker)
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(invoker.calls(), vec!["k1", "k2", "k3"]);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let invoker = ScriptedInvoker::new(&[
            ("k1", Reply::Retryable("429 k1")),
            ("k2", Reply::Retryable("429 k2")),
            ("k3", Reply::Retryable("429 k3")),
        ]);

        let err = ExecutionEngine::new()
            .execute(&pool(&["k1", "k2", "k3"]), &invoker)
            .await
            .unwrap_err();

        assert_eq!(err.into_inner(), "429 k3");
        assert_eq!(invoker.calls(), vec!["k1", "k2", "k3"]);
    }

    #[tokio::test]
    async fn test_fatal_short_circuits() {
        let invoker = ScriptedInvoker::new(&[
            ("k1", Reply::Retryable("429 k1")),
            ("k2", Reply::Fatal("400 bad model")),
            ("k3", Reply::Ok("never")),
        ]);

        let err = ExecutionEngine::new()
            .execute(&pool(&["k1", "k2", "k3"]), &invoker)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Fatal);
        assert_eq!(err.into_inner(), "400 bad model");
        assert_eq!(invoker.calls(), vec!["k1", "k2"]);
    }

    #[tokio::test]
    async fn test_empty_pool_rejected_before_any_invocation() {
        let invoker = ScriptedInvoker::new(&[]);
        let empty: Vec<&str> = Vec::new();

        assert_eq!(CredentialPool::normalize(empty), Err(PoolError::EmptyPool));
        assert!(invoker.calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_credential_degenerates_to_one_call() {
        let engine = ExecutionEngine::new();
        let single = CredentialPool::normalize("k").unwrap();

        let ok = ScriptedInvoker::new(&[("k", Reply::Ok("value"))]);
        assert_eq!(engine.execute(&single, &ok).await.unwrap(), "value");
        assert_eq!(ok.calls().len(), 1);

        let retryable = ScriptedInvoker::new(&[("k", Reply::Retryable("429"))]);
        let err = engine.execute(&single, &retryable).await.unwrap_err();
        assert_eq!(err.into_inner(), "429");
        assert_eq!(retryable.calls().len(), 1);

        let fatal = ScriptedInvoker::new(&[("k", Reply::Fatal("401"))]);
        let err = engine.execute(&single, &fatal).await.unwrap_err();
        assert_eq!(err.into_inner(), "401");
        assert_eq!(fatal.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_single_key_and_singleton_list_behave_the_same() {
        let engine = ExecutionEngine::new();
        let script = [("k", Reply::Retryable("429"))];

        let a = ScriptedInvoker::new(&script);
        let b = ScriptedInvoker::new(&script);
        let ra = engine
            .execute_with_report(&CredentialPool::normalize("k").unwrap(), &a)
            .await;
        let rb = engine
            .execute_with_report(&CredentialPool::normalize(vec!["k"]).unwrap(), &b)
            .await;

        assert_eq!(ra.attempts, rb.attempts);
        assert_eq!(a.calls(), b.calls());
    }

    #[tokio::test]
    async fn test_observer_sees_retryable_then_success() {
        let observer = RecordingObserver::new();
        let engine = ExecutionEngine::new()
            .with_observer(observer.clone())
            .with_mask_prefix(2);
        let invoker = ScriptedInvoker::new(&[
            ("key-one", Reply::Retryable("429")),
            ("key-two", Reply::Retryable("429")),
            ("key-three", Reply::Ok("ok")),
        ]);

        let result = engine
            .execute(&pool(&["key-one", "key-two", "key-three"]), &invoker)
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(
            observer.events(),
            vec![
                AttemptEvent::AttemptStarted {
                    index: 1,
                    total: 3,
                    credential: "ke...".to_string()
                },
                AttemptEvent::AttemptFailedRetryable { index: 1 },
                AttemptEvent::AttemptStarted {
                    index: 2,
                    total: 3,
                    credential: "ke...".to_string()
                },
                AttemptEvent::AttemptFailedRetryable { index: 2 },
                AttemptEvent::AttemptStarted {
                    index: 3,
                    total: 3,
                    credential: "ke...".to_string()
                },
                AttemptEvent::AttemptSucceeded { index: 3 },
            ]
        );
    }

    #[tokio::test]
    async fn test_observer_sees_exhaustion_and_fatal() {
        let observer = RecordingObserver::new();
        let engine = ExecutionEngine::new().with_observer(observer.clone());

        let invoker = ScriptedInvoker::new(&[("a", Reply::Retryable("429")), ("b", Reply::Retryable("429"))]);
        let _ = engine.execute(&pool(&["a", "b"]), &invoker).await;
        assert_eq!(
            observer.events().last(),
            Some(&AttemptEvent::AllAttemptsExhausted { total: 2 })
        );

        observer.clear();
        let invoker = ScriptedInvoker::new(&[("a", Reply::Fatal("401"))]);
        let _ = engine.execute(&pool(&["a", "b"]), &invoker).await;
        let events = observer.events();
        assert_eq!(events.last(), Some(&AttemptEvent::AttemptFailedFatal { index: 1 }));
        assert!(!events.contains(&AttemptEvent::AllAttemptsExhausted { total: 2 }));
    }

    /// In-memory log sink shared between the subscriber and the test
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[tokio::test]
    async fn test_tracing_observer_logs_only_masked_keys() {
        use crate::services::rotation::observer::TracingObserver;

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let engine = ExecutionEngine::new()
            .with_observer(TracingObserver::for_target("openai"))
            .with_mask_prefix(6);
        let invoker = ScriptedInvoker::new(&[
            ("sk-limited-0123456789", Reply::Retryable("429")),
            ("sk-healthy-9876543210", Reply::Ok("ok")),
        ]);

        let result = engine
            .execute(
                &pool(&["sk-limited-0123456789", "sk-healthy-9876543210"]),
                &invoker,
            )
            .await;
        assert_eq!(result.unwrap(), "ok");

        let output = logs.contents();
        assert!(output.contains("\"credential\":\"sk-lim...\""), "{}", output);
        assert!(output.contains("\"credential\":\"sk-hea...\""), "{}", output);
        assert!(output.contains("\"target_name\":\"openai\""), "{}", output);
        assert!(!output.contains("sk-limited-0123456789"));
        assert!(!output.contains("sk-healthy-9876543210"));
    }

    #[tokio::test]
    async fn test_report_lists_attempts() {
        let invoker = ScriptedInvoker::new(&[
            ("sk-aaaaaaaaaaaaaaaaaaaaaaaa", Reply::Retryable("429")),
            ("sk-bbbbbbbbbbbbbbbbbbbbbbbb", Reply::Fatal("500")),
        ]);

        let report = ExecutionEngine::new()
            .execute_with_report(
                &pool(&["sk-aaaaaaaaaaaaaaaaaaaaaaaa", "sk-bbbbbbbbbbbbbbbbbbbbbbbb"]),
                &invoker,
            )
            .await;

        assert_eq!(report.attempt_count(), 2);
        assert_eq!(
            report.attempts,
            vec![
                Attempt {
                    index: 1,
                    credential: "sk-aaaaaaa...".to_string(),
                    outcome: AttemptOutcome::FailedRetryable,
                },
                Attempt {
                    index: 2,
                    credential: "sk-bbbbbbb...".to_string(),
                    outcome: AttemptOutcome::FailedFatal,
                },
            ]
        );
        assert_eq!(report.into_result().unwrap_err().into_inner(), "500");
    }

    #[tokio::test]
    async fn test_engine_is_shareable_across_concurrent_calls() {
        let engine = ExecutionEngine::new().with_observer(RecordingObserver::new());
        let left = ScriptedInvoker::new(&[("l1", Reply::Retryable("429")), ("l2", Reply::Ok("left"))]);
        let right = ScriptedInvoker::new(&[("r1", Reply::Ok("right"))]);
        let left_pool = pool(&["l1", "l2"]);
        let right_pool = pool(&["r1"]);

        let (l, r) = tokio::join!(
            engine.execute(&left_pool, &left),
            engine.execute(&right_pool, &right)
        );

        assert_eq!(l.unwrap(), "left");
        assert_eq!(r.unwrap(), "right");
        assert_eq!(left.calls(), vec!["l1", "l2"]);
        assert_eq!(right.calls(), vec!["r1"]);
    }

    #[test]
    fn test_engine_defaults() {
        let engine = ExecutionEngine::default();
        assert!(!engine.has_observer());
        assert_eq!(engine.mask_prefix(), DEFAULT_MASK_PREFIX);
        assert_eq!(
            format!("{:?}", engine),
            "ExecutionEngine { observer: false, mask_prefix: 10 }"
        );
    }
}
