//! Environment lifecycle controller
//!
//! An [`Environment`] brackets a test run with ordered setup and finish
//! routines and guarantees cleanup even under partial failure:
//!
//! - setup routines run in registration order, threading the evolving
//!   [`EnvConfig`] from one to the next; the first failure skips the rest
//!   of setup and the test body entirely
//! - the test body runs in a spawned task, so a panic is caught and
//!   reported like any other failure
//! - finish routines all run in registration order no matter what failed
//!   before them; their errors are aggregated, never short-circuited
//!
//! The overall outcome combines the body's own result with the setup
//! failure (if any) and every finish failure: any of them marks the run
//! failed, even if the body itself passed.

mod config;
pub mod funcs;

pub use config::{random_name, EnvConfig};

use std::future::Future;

use futures::future::{BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{AggregateError, Error};

type LifecycleFn =
    Box<dyn FnOnce(CancellationToken, EnvConfig) -> BoxFuture<'static, Result<EnvConfig, Error>> + Send>;

/// Lifecycle states of one run. A run always reaches `Done`; failures are
/// recorded in the [`RunReport`] alongside the phase they occurred in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// No run started yet
    #[default]
    Idle,
    /// Setup routines executing
    SettingUp,
    /// Test body executing
    Running,
    /// Finish routines executing
    FinishingUp,
    /// Terminal
    Done,
}

/// Outcome of one lifecycle run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Terminal phase; always `Done` for a completed run
    pub phase: Phase,
    /// Phase in which the first failure occurred, if any
    pub failed_phase: Option<Phase>,
    /// The setup failure that aborted the run, if any
    pub setup_error: Option<Error>,
    /// The test body's failure (or caught panic), if any
    pub body_error: Option<Error>,
    /// Every finish routine failure, in registration order
    pub finish_errors: Vec<Error>,
}

impl RunReport {
    /// True when setup, body, and every finish routine all succeeded
    pub fn is_success(&self) -> bool {
        self.setup_error.is_none() && self.body_error.is_none() && self.finish_errors.is_empty()
    }

    /// Fold the report into a single result: the setup or body failure
    /// first, then finish failures; multiple failures aggregate.
    pub fn into_result(self) -> Result<(), Error> {
        let mut errors = Vec::new();
        if let Some(err) = self.setup_error {
            errors.push(Error::Setup(Box::new(err)));
        }
        if let Some(err) = self.body_error {
            errors.push(err);
        }
        errors.extend(self.finish_errors);
        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(AggregateError(errors).into())
        }
    }
}

/// Sequences setup and finish routines around a test body.
///
/// Independent environments share no mutable state; a single environment
/// owns its [`EnvConfig`] exclusively for the duration of one run.
pub struct Environment {
    config: EnvConfig,
    setup: Vec<LifecycleFn>,
    finish: Vec<LifecycleFn>,
    ctx: CancellationToken,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create an environment with an empty configuration
    pub fn new() -> Self {
        Self::with_config(EnvConfig::new())
    }

    /// Create an environment with the given starting configuration
    pub fn with_config(config: EnvConfig) -> Self {
        Self {
            config,
            setup: Vec::new(),
            finish: Vec::new(),
            ctx: CancellationToken::new(),
        }
    }

    /// Use a caller-provided cancellation token for the whole run
    pub fn with_cancellation(mut self, ctx: CancellationToken) -> Self {
        self.ctx = ctx;
        self
    }

    /// Token that cancels this environment's run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.ctx.clone()
    }

    /// The configuration the run will start from
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Register a setup routine; routines run in registration order
    pub fn setup<F, Fut>(mut self, routine: F) -> Self
    where
        F: FnOnce(CancellationToken, EnvConfig) -> Fut + Send + 'static,
        Fut: Future<Output = Result<EnvConfig, Error>> + Send + 'static,
    {
        self.setup.push(Box::new(move |ctx, config| routine(ctx, config).boxed()));
        self
    }

    /// Register a finish routine; routines run in registration order and
    /// are all attempted regardless of earlier failures
    pub fn finish<F, Fut>(mut self, routine: F) -> Self
    where
        F: FnOnce(CancellationToken, EnvConfig) -> Fut + Send + 'static,
        Fut: Future<Output = Result<EnvConfig, Error>> + Send + 'static,
    {
        self.finish.push(Box::new(move |ctx, config| routine(ctx, config).boxed()));
        self
    }

    /// Run the full lifecycle around `body`.
    ///
    /// The body receives the configuration produced by setup. It executes
    /// only if every setup routine succeeded and runs as a spawned task so
    /// panics are captured into the report.
    pub async fn run<F, Fut>(self, body: F) -> RunReport
    where
        F: FnOnce(EnvConfig) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let ctx = self.ctx;
        let mut config = self.config;
        let mut report = RunReport::default();

        info!(routines = self.setup.len(), "entering setup phase");
        report.phase = Phase::SettingUp;
        for routine in self.setup {
            if ctx.is_cancelled() {
                report.setup_error = Some(Error::Cancelled);
                report.failed_phase = Some(Phase::SettingUp);
                break;
            }
            let before = routine_input(&config);
            match routine(ctx.clone(), config).await {
                Ok(next) => config = next,
                Err(err) => {
                    error!(error = %err, "setup routine failed; skipping remaining setup and test body");
                    report.setup_error = Some(err);
                    report.failed_phase = Some(Phase::SettingUp);
                    config = before;
                    break;
                }
            }
        }

        if report.setup_error.is_none() {
            report.phase = Phase::Running;
            if ctx.is_cancelled() {
                report.body_error = Some(Error::Cancelled);
                report.failed_phase = Some(Phase::Running);
            } else {
                debug!("entering test body");
                match tokio::spawn(body(config.clone())).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        report.body_error = Some(err);
                        report.failed_phase = Some(Phase::Running);
                    }
                    Err(join_err) => {
                        let message = if join_err.is_panic() {
                            panic_message(join_err.into_panic())
                        } else {
                            "test body task was aborted".to_string()
                        };
                        report.body_error = Some(Error::Panic(message));
                        report.failed_phase = Some(Phase::Running);
                    }
                }
            }
        }

        info!(routines = self.finish.len(), "entering finish phase");
        report.phase = Phase::FinishingUp;
        for routine in self.finish {
            let before = routine_input(&config);
            match routine(ctx.clone(), config).await {
                Ok(next) => config = next,
                Err(err) => {
                    warn!(error = %err, "finish routine failed; continuing cleanup");
                    report.finish_errors.push(err);
                    config = before;
                }
            }
        }
        if !report.finish_errors.is_empty() && report.failed_phase.is_none() {
            report.failed_phase = Some(Phase::FinishingUp);
        }

        report.phase = Phase::Done;
        report
    }
}

/// A failing routine does not return a config; the next routine continues
/// from the last good one.
fn routine_input(config: &EnvConfig) -> EnvConfig {
    config.clone()
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
