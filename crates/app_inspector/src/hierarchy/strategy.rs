//! Ordered fallback over hierarchy dump strategies
//!
//! Devices expose different subsets of automation backends, so a dump tries
//! each strategy in turn. The one that succeeds is moved to the front, which
//! makes the next dump on the same device hit the working backend first.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{DriverError, Result};

pub type DumpFuture = BoxFuture<'static, Result<String>>;

/// A named way of fetching a hierarchy payload
#[derive(Clone)]
pub struct Strategy {
    name: String,
    run: Arc<dyn Fn() -> DumpFuture + Send + Sync>,
}

impl Strategy {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn() -> DumpFuture + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy").field("name", &self.name).finish()
    }
}

/// Strategy list with promote-on-success ordering.
///
/// The order is only touched inside short critical sections: each dump works
/// on a snapshot and promotes the winner by name afterwards, so concurrent
/// dumps can neither duplicate nor lose entries.
#[derive(Debug)]
pub struct StrategyChain {
    strategies: Mutex<Vec<Strategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        debug_assert!(
            {
                let mut names: Vec<&str> = strategies.iter().map(Strategy::name).collect();
                names.sort_unstable();
                names.windows(2).all(|w| w[0] != w[1])
            },
            "strategy names must be unique"
        );
        Self {
            strategies: Mutex::new(strategies),
        }
    }

    /// Current try order
    pub fn order(&self) -> Vec<String> {
        self.strategies
            .lock()
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    /// Try every strategy in order and return the first payload.
    ///
    /// Recoverable failures move on to the next strategy; any other error is
    /// returned as is. When every strategy fails the order is left untouched.
    pub async fn dump(&self) -> Result<String> {
        let snapshot = self.strategies.lock().clone();
        let mut failures = Vec::with_capacity(snapshot.len());

        for strategy in snapshot {
            debug!("try to dump with {}", strategy.name);
            match (strategy.run)().await {
                Ok(payload) => {
                    debug!("dump success with {}", strategy.name);
                    self.promote(&strategy.name);
                    return Ok(payload);
                }
                Err(err) if err.is_recoverable() => {
                    debug!("dump with {} failed: {}", strategy.name, err);
                    failures.push(format!("{}: {}", strategy.name, err));
                }
                Err(err) => return Err(err),
            }
        }

        Err(DriverError::AllStrategiesFailed(failures.join("; ")))
    }

    /// Move the named strategy to the front, keeping the others in order
    pub fn promote(&self, name: &str) {
        let mut strategies = self.strategies.lock();
        if let Some(pos) = strategies.iter().position(|s| s.name == name) {
            if pos > 0 {
                debug!("promote strategy {} to front", name);
                let strategy = strategies.remove(pos);
                strategies.insert(0, strategy);
            }
        }
    }
}
