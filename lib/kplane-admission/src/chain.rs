//! Composable validation with fail-fast semantics

use async_trait::async_trait;
use kplane_core::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, Instrument};

/// Admission operation under review
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded window a single admission review runs in.
///
/// Every suspending call a check makes goes through [`AdmissionContext::guard`],
/// which rejects on timeout, cancellation or query failure.
#[derive(Clone, Debug)]
pub struct AdmissionContext {
    deadline: Instant,
    cancel: CancellationToken,
}

impl AdmissionContext {
    pub fn new(timeout: Duration) -> Self {
        Self::with_cancellation(timeout, CancellationToken::new())
    }

    pub fn with_cancellation(timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            cancel,
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `query` inside the admission window
    pub async fn guard<T, E, F>(&self, what: &str, query: F) -> Result<T>
    where
        E: fmt::Display,
        F: Future<Output = std::result::Result<T, E>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(CoreError::Validation(format!("{}: admission cancelled", what)))
            }
            result = tokio::time::timeout_at(self.deadline, query) => match result {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(CoreError::Validation(format!("{}: {}", what, err))),
                Err(_) => Err(CoreError::Validation(format!("{}: timed out", what))),
            },
        }
    }
}

/// A named check over an object under admission
#[async_trait]
pub trait Validate<T: Sync>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn validate(&self, ctx: &AdmissionContext, object: &T, op: Operation) -> Result<()>;
}

/// Ordered checks; the first failure is returned and later checks do not run
pub struct ValidationChain<T> {
    name: &'static str,
    checks: Vec<Box<dyn Validate<T>>>,
}

impl<T: Sync> ValidationChain<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            checks: Vec::new(),
        }
    }

    /// Append a check to the chain
    pub fn add<V: Validate<T> + 'static>(mut self, check: V) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }
}

#[async_trait]
impl<T: Sync> Validate<T> for ValidationChain<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn validate(&self, ctx: &AdmissionContext, object: &T, op: Operation) -> Result<()> {
        for check in &self.checks {
            let span = debug_span!("validate", chain = self.name, check = check.name(), %op);
            if let Err(err) = check.validate(ctx, object, op).instrument(span).await {
                debug!(chain = self.name, check = check.name(), error = %err, "Check failed");
                return Err(err);
            }
        }
        Ok(())
    }
}

/// A synchronous check built from a closure
pub struct FnValidator<F> {
    name: &'static str,
    check: F,
}

pub fn from_fn<F>(name: &'static str, check: F) -> FnValidator<F> {
    FnValidator { name, check }
}

#[async_trait]
impl<T, F> Validate<T> for FnValidator<F>
where
    T: Sync,
    F: Fn(&T, Operation) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn validate(&self, _ctx: &AdmissionContext, object: &T, op: Operation) -> Result<()> {
        (self.check)(object, op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Builds a chain from a pattern like "S -> S -> F" and counts successes
    fn chain_from(pattern: &str, successes: Arc<AtomicUsize>) -> ValidationChain<()> {
        pattern
            .split("->")
            .map(str::trim)
            .fold(ValidationChain::new("test"), |chain, step| {
                let successes = successes.clone();
                match step {
                    "S" => chain.add(from_fn("success", move |_: &(), _: Operation| -> Result<()> {
                        successes.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })),
                    _ => chain.add(from_fn("failure", |_: &(), _: Operation| -> Result<()> {
                        Err(CoreError::Validation("validation failed".to_string()))
                    })),
                }
            })
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_failure() {
        let cases = [
            ("S -> S -> S -> S", false, 4),
            ("S -> S -> S -> S -> F", true, 4),
            ("S -> S -> F -> S -> S", true, 2),
            ("F -> S -> S -> S -> S", true, 0),
        ];
        for (pattern, want_err, want_successes) in cases {
            let successes = Arc::new(AtomicUsize::new(0));
            let chain = chain_from(pattern, successes.clone());
            let ctx = AdmissionContext::new(Duration::from_secs(1));

            let result = chain.validate(&ctx, &(), Operation::Create).await;
            assert_eq!(result.is_err(), want_err, "{}", pattern);
            assert_eq!(successes.load(Ordering::SeqCst), want_successes, "{}", pattern);
        }
    }

    #[tokio::test]
    async fn test_empty_chain_allows() {
        let chain: ValidationChain<()> = ValidationChain::new("empty");
        assert!(chain.is_empty());
        let ctx = AdmissionContext::new(Duration::from_secs(1));
        assert!(chain.validate(&ctx, &(), Operation::Delete).await.is_ok());
    }

    #[tokio::test]
    async fn test_guard_times_out() {
        let ctx = AdmissionContext::new(Duration::from_millis(50));
        let err = ctx
            .guard("list clusters", async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, CoreError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_guard_rejects_when_cancelled() {
        let token = CancellationToken::new();
        let ctx = AdmissionContext::with_cancellation(Duration::from_secs(10), token.clone());
        token.cancel();
        let err = ctx
            .guard("list clusters", async { Ok::<_, CoreError>(1) })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }

    #[tokio::test]
    async fn test_guard_maps_query_errors_to_validation() {
        let ctx = AdmissionContext::new(Duration::from_secs(1));
        let err = ctx
            .guard("list clusters", async { Err::<(), _>("connection refused") })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "list clusters: connection refused");
        assert_eq!(err.status_code(), 500);
    }
}
