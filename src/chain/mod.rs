//! Deferred, ordered application of async steps to a value.
//!
//! A [`DeferredChain`] owns a target and a queue of named steps. Nothing runs
//! until [`DeferredChain::execute`]; each step then consumes the current
//! target and returns its replacement, so later steps see everything earlier
//! ones did.
//!
//! ```
//! use threadrun::chain::DeferredChain;
//!
//! # async fn example() -> threadrun::error::Result<()> {
//! let total = DeferredChain::new(1u32)
//!     .then("double", |n| async move { Ok(n * 2) })
//!     .then("add three", |n| async move { Ok(n + 3) })
//!     .execute()
//!     .await?;
//! assert_eq!(total, 5);
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use futures::future::BoxFuture;
use tracing::debug;

use crate::error::ThreadrunError;

type Step<T> = Box<dyn FnOnce(T) -> BoxFuture<'static, Result<T, ThreadrunError>> + Send>;

/// Queue of steps to apply, in order, to a target value.
pub struct DeferredChain<T> {
    target: T,
    steps: Vec<(String, Step<T>)>,
}

impl<T: Send + 'static> DeferredChain<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            steps: Vec::new(),
        }
    }

    /// Queue a step without running it.
    pub fn then<F, Fut>(mut self, name: impl Into<String>, step: F) -> Self
    where
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ThreadrunError>> + Send + 'static,
    {
        self.steps
            .push((name.into(), Box::new(move |target| Box::pin(step(target)))));
        self
    }

    /// Names of the queued steps, in execution order.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every queued step sequentially and return the final target.
    ///
    /// The first failing step stops the chain; its error is returned and the
    /// remaining steps are dropped unrun. Effects of completed steps stand.
    pub async fn execute(self) -> Result<T, ThreadrunError> {
        let total = self.steps.len();
        let mut target = self.target;
        for (index, (name, step)) in self.steps.into_iter().enumerate() {
            debug!(step = %name, index, total, "running chain step");
            target = step(target).await.map_err(|err| {
                debug!(step = %name, error = %err, "chain step failed");
                err
            })?;
        }
        Ok(target)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for DeferredChain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredChain")
            .field("target", &self.target)
            .field(
                "steps",
                &self.steps.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
