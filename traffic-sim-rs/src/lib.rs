//! # Traffic Simulator
//!
//! Drives a steady stream of navigation queries at the ART assistant so the
//! observability stack has realistic and faulty traffic to show.
//!
//! This crate provides:
//!
//! - A fault-injecting decorator for the assistant's vector search
//!   (simulated timeouts and slow queries)
//! - The navigation assistant with in-memory and Qdrant-backed vector stores
//! - The traffic driver loop with cooperative cancellation
//! - Configuration, error handling and console reporting
//!
//! ## Architecture
//!
//! - `VectorSearch`: similarity search capability, the fault injection seam
//! - `FaultInjectingSearch`: decorator applying a `FaultPolicy` per call
//! - `Assistant`: answers one query, may search any number of times
//! - `TrafficDriver`: pick, submit, classify, report, pause
//! - `Simulation`: the driver wired to the navigation assistant

pub mod error;
pub use error::{Result, SimError};

pub mod config;
pub use config::{BackendConfig, ConfigProvider, EnvConfigProvider, SimulationConfig};

pub mod search;
pub use search::{InMemoryVectorStore, QdrantStore, ScoredDocument, SearchOptions, VectorSearch};

pub mod fault;
pub use fault::{FaultDecision, FaultInjectingSearch, FaultPolicy, RollSource};

pub mod assistant;
pub use assistant::{Assistant, Collaborators, LlmClient, NavigatorAssistant};

pub mod driver;
pub use driver::{
    run_until_interrupted, IterationReport, QueryStatus, RunSummary, Simulation, StatusReporter,
    TrafficDriver,
};

pub mod console;
pub use console::ConsoleReporter;

mod text;

#[cfg(test)]
mod tests;
