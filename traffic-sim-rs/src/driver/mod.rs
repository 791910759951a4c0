//! Traffic driver
//!
//! Sends one random navigation query per iteration to the assistant, classifies
//! the outcome, reports it, then pauses. The loop stops when its
//! `CancellationToken` fires, even mid-query, or after `max_iterations`.

mod status;

pub use status::{IterationReport, QueryStatus, RunSummary};

use std::future::Future;
use std::io;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::assistant::{Assistant, Collaborators, NavigatorAssistant};
use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::fault::{FaultInjectingSearch, FaultStatsSnapshot};

// Keeps the fault rolls independent of the query picker under one seed
const FAULT_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Receives everything the simulation has to say to its operator
pub trait StatusReporter: Send + Sync {
    /// The simulation cannot start
    fn startup_failure(&self, error: &SimError);

    /// One query finished
    fn iteration(&self, report: &IterationReport);
}

/// Submits queries to an assistant and reports their outcome
pub struct TrafficDriver {
    config: SimulationConfig,
    assistant: Arc<dyn Assistant>,
    reporter: Arc<dyn StatusReporter>,
    rng: StdRng,
    run_counter: u64,
    summary: RunSummary,
}

impl TrafficDriver {
    pub fn new(
        config: SimulationConfig,
        assistant: Arc<dyn Assistant>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            assistant,
            reporter,
            rng,
            run_counter: 0,
            summary: RunSummary::default(),
        })
    }

    /// Number of iterations started so far
    pub fn run_counter(&self) -> u64 {
        self.run_counter
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    fn pick_query(&mut self) -> String {
        let index = self.rng.gen_range(0..self.config.queries.len());
        self.config.queries[index].clone()
    }

    fn iterations_exhausted(&self) -> bool {
        self.config
            .max_iterations
            .map_or(false, |max| self.run_counter >= max)
    }

    /// Run a single iteration: pick, submit, classify, report
    pub async fn run_once(&mut self) -> IterationReport {
        let query = self.pick_query();
        self.run_counter += 1;

        let started = Instant::now();
        let outcome = self.assistant.get_response(&query).await;
        let elapsed = started.elapsed();

        let status = QueryStatus::classify(&outcome);
        match &status {
            QueryStatus::Error(message) => log::warn!(
                "Request {} failed after {:?}: {}",
                self.run_counter,
                elapsed,
                message
            ),
            other => log::info!(
                "Request {} finished in {:?} with status {}",
                self.run_counter,
                elapsed,
                other.label()
            ),
        }

        let report = IterationReport {
            run: self.run_counter,
            query,
            status,
            elapsed,
        };

        self.summary.record(&report.status);
        self.reporter.iteration(&report);
        report
    }

    /// Loop until `cancel` fires or the iteration limit is reached
    ///
    /// Cancellation is observed while a query is in flight as well as during
    /// the pause; an interrupted query is neither classified nor reported.
    pub async fn run(&mut self, cancel: CancellationToken) -> RunSummary {
        log::info!("Traffic simulation started");

        loop {
            if cancel.is_cancelled() || self.iterations_exhausted() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("Request {} abandoned on shutdown", self.run_counter);
                    break;
                }
                _ = self.run_once() => {}
            }

            if cancel.is_cancelled() || self.iterations_exhausted() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.loop_interval) => {}
            }
        }

        log::info!("Traffic simulation stopped after {} requests", self.run_counter);
        self.summary.clone()
    }
}

/// Drive `run` until it finishes or `interrupt` fires
///
/// An interrupt cancels `cancel` and then waits for `run` to wind down. An
/// interrupt source that fails to install is returned as an error.
pub async fn run_until_interrupted<T, R, I>(run: R, interrupt: I, cancel: &CancellationToken) -> Result<T>
where
    R: Future<Output = T>,
    I: Future<Output = io::Result<()>>,
{
    tokio::pin!(run);

    tokio::select! {
        outcome = &mut run => Ok(outcome),
        signal = interrupt => {
            signal.map_err(|e| SimError::initialization(format!("Failed to listen for Ctrl+C: {}", e)))?;
            log::info!("Interrupt received, stopping traffic simulation");
            cancel.cancel();
            Ok(run.await)
        }
    }
}

/// A driver wired to the navigation assistant behind fault injection
pub struct Simulation {
    driver: TrafficDriver,
    faults: Arc<FaultInjectingSearch>,
}

impl Simulation {
    /// Validate, wrap the vector store with fault injection, build the assistant
    ///
    /// Failures are reported through `reporter` before being returned; none of
    /// them produce an iteration line.
    pub fn prepare(
        config: SimulationConfig,
        collaborators: Result<Collaborators>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Result<Self> {
        match Self::assemble(config, collaborators, Arc::clone(&reporter)) {
            Ok(simulation) => Ok(simulation),
            Err(error) => {
                reporter.startup_failure(&error);
                Err(error)
            }
        }
    }

    fn assemble(
        config: SimulationConfig,
        collaborators: Result<Collaborators>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Result<Self> {
        config.validate()?;

        let collaborators = collaborators.map_err(|e| {
            if e.is_startup_fatal() {
                e
            } else {
                SimError::initialization(e.to_string())
            }
        })?;

        let store = collaborators.vector_store.ok_or_else(|| {
            SimError::vector_store_unavailable("cannot inject faults or run traffic")
        })?;

        let fault_seed = config.seed.map(|seed| seed ^ FAULT_SEED_SALT);
        let faults = Arc::new(FaultInjectingSearch::with_random_rolls(
            store,
            config.fault_policy(),
            fault_seed,
        ));

        let assistant = Arc::new(NavigatorAssistant::new(faults.clone(), collaborators.llm));
        let driver = TrafficDriver::new(config, assistant, reporter)?;

        Ok(Self { driver, faults })
    }

    /// Run until cancelled; returns the request summary and fault counters
    pub async fn run(mut self, cancel: CancellationToken) -> (RunSummary, FaultStatsSnapshot) {
        let summary = self.driver.run(cancel).await;
        (summary, self.faults.stats())
    }
}
