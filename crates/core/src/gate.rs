//! Availability gates for optionally licensed remote modules.
//!
//! A gate starts unprobed. The first call probes the remote service once and
//! the outcome (available or not licensed) is then fixed for the lifetime of
//! the process. Transient probe failures leave the gate unprobed so the next
//! call tries again. Callers that arrive while a probe is in flight wait for
//! it and take its outcome, transient failures included.

use crate::error::{RemoteError, ToolError};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

/// Remote modules that may be disabled per subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    Payroll,
}

impl Module {
    pub fn name(self) -> &'static str {
        match self {
            Self::Payroll => "payroll",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Payroll => "Payroll",
        }
    }

    pub fn upgrade_hint(self) -> &'static str {
        match self {
            Self::Payroll => {
                "it is not enabled for this subscription. Activate the Payroll module \
                 in the account settings or upgrade the plan to use employee, absence \
                 and payroll document tools"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

/// Whether a probe failure means "not licensed" rather than a transient error.
fn is_unlicensed(err: &RemoteError) -> bool {
    matches!(err.status, Some(403) | Some(404))
}

/// Memoized availability of one module.
#[derive(Debug)]
pub struct ModuleGate {
    module: Module,
    state: OnceCell<Availability>,
    /// Completed probe attempts; only advanced while `last_failure` is locked.
    attempts: AtomicU64,
    /// Held for the duration of a probe.
    last_failure: Mutex<Option<RemoteError>>,
}

impl ModuleGate {
    pub fn new(module: Module) -> Self {
        Self {
            module,
            state: OnceCell::new(),
            attempts: AtomicU64::new(0),
            last_failure: Mutex::new(None),
        }
    }

    pub fn module(&self) -> Module {
        self.module
    }

    /// `None` until the first conclusive probe.
    pub fn state(&self) -> Option<Availability> {
        self.state.get().copied()
    }

    /// Succeeds when the module is available, probing at most once per process.
    pub async fn ensure_available<F, Fut>(&self, probe: F) -> Result<(), ToolError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), RemoteError>>,
    {
        if let Some(availability) = self.state.get() {
            return self.outcome(*availability);
        }

        let seen = self.attempts.load(Ordering::Acquire);
        let mut last_failure = self.last_failure.lock().await;
        if let Some(availability) = self.state.get() {
            return self.outcome(*availability);
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            // A probe finished while we waited and left the gate unprobed.
            if let Some(err) = last_failure.as_ref() {
                return Err(err.clone().into());
            }
        }

        let module = self.module;
        let result = probe().await;
        self.attempts.fetch_add(1, Ordering::Release);
        let availability = match result {
            Ok(()) => {
                info!(module = module.name(), "Module available");
                Availability::Available
            }
            Err(err) if is_unlicensed(&err) => {
                warn!(
                    module = module.name(),
                    status = ?err.status,
                    "Module not licensed, disabling its tools for this process"
                );
                Availability::Unavailable
            }
            Err(err) => {
                warn!(module = module.name(), error = %err, "Module probe failed, will retry");
                *last_failure = Some(err.clone());
                return Err(err.into());
            }
        };

        *last_failure = None;
        let _ = self.state.set(availability);
        self.outcome(availability)
    }

    fn outcome(&self, availability: Availability) -> Result<(), ToolError> {
        match availability {
            Availability::Available => Ok(()),
            Availability::Unavailable => Err(ToolError::module_unavailable(self.module)),
        }
    }
}

/// One gate per optional module.
#[derive(Debug)]
pub struct ModuleGates {
    payroll: ModuleGate,
}

impl ModuleGates {
    pub fn new() -> Self {
        Self {
            payroll: ModuleGate::new(Module::Payroll),
        }
    }

    pub fn gate(&self, module: Module) -> &ModuleGate {
        match module {
            Module::Payroll => &self.payroll,
        }
    }
}

impl Default for ModuleGates {
    fn default() -> Self {
        Self::new()
    }
}
