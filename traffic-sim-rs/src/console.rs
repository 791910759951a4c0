// traffic-sim-rs/src/console.rs
// Colored console output for the traffic simulator

use colored::Colorize;

use crate::config::SimulationConfig;
use crate::driver::{IterationReport, QueryStatus, RunSummary, StatusReporter};
use crate::error::SimError;
use crate::fault::FaultStatsSnapshot;

/// Prints status lines to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    /// Startup banner lines
    pub fn banner_lines(config: &SimulationConfig) -> Vec<String> {
        vec![
            "Starting Traffic Simulation...".bold().cyan().to_string(),
            format!(
                "Sending navigation requests to ART every {} seconds.",
                config.loop_interval.as_secs_f64()
            ),
            format!(
                "Fault injection: {}% errors, {}% slow queries.",
                config.error_percent(),
                config.slow_percent()
            ),
            format!("Press {} to stop.\n", "Ctrl+C".bold().red()),
        ]
    }

    /// Message shown when the simulation cannot start
    pub fn startup_failure_line(error: &SimError) -> String {
        match error {
            SimError::VectorStoreUnavailable(_) => {
                "Vector store unavailable. Cannot inject faults or run traffic."
                    .bold()
                    .red()
                    .to_string()
            }
            other => format!("{} {}", "Error initializing ART:".bold().red(), other),
        }
    }

    /// One iteration, with the status word colored
    pub fn iteration_line(report: &IterationReport) -> String {
        let status = match &report.status {
            QueryStatus::Success => report.status.label().green().to_string(),
            QueryStatus::Unknown => report.status.label().yellow().to_string(),
            QueryStatus::Error(message) => format!("{} ({})", report.status.label().red(), message),
        };

        format!("[{}] '{}' -> {}", report.run, report.query, status)
    }

    /// Final lines printed after the loop stops
    pub fn shutdown_lines(summary: &RunSummary, faults: &FaultStatsSnapshot) -> Vec<String> {
        vec![
            "\nTraffic simulation stopped.".bold().cyan().to_string(),
            format!("Requests: {}", summary),
            format!("Vector store: {}", faults),
        ]
    }

    pub fn print_banner(&self, config: &SimulationConfig) {
        for line in Self::banner_lines(config) {
            println!("{}", line);
        }
    }

    pub fn print_shutdown(&self, summary: &RunSummary, faults: &FaultStatsSnapshot) {
        for line in Self::shutdown_lines(summary, faults) {
            println!("{}", line);
        }
    }
}

impl StatusReporter for ConsoleReporter {
    fn startup_failure(&self, error: &SimError) {
        println!("{}", Self::startup_failure_line(error));
    }

    fn iteration(&self, report: &IterationReport) {
        println!("{}", Self::iteration_line(report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};
    use std::time::Duration;

    // The color override is process-wide
    static COLOR_LOCK: Mutex<()> = Mutex::new(());

    fn colors(enabled: bool) -> MutexGuard<'static, ()> {
        let guard = COLOR_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        colored::control::set_override(enabled);
        guard
    }

    fn plain() -> MutexGuard<'static, ()> {
        colors(false)
    }

    fn report(run: u64, status: QueryStatus) -> IterationReport {
        IterationReport {
            run,
            query: "Can we get a navigation check?".to_string(),
            status,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_iteration_line_matches_report_display() {
        let _colors = plain();
        let success = report(1, QueryStatus::Success);
        assert_eq!(ConsoleReporter::iteration_line(&success), success.to_string());

        let failure = report(2, QueryStatus::Error("Timeout error: unreachable".to_string()));
        assert_eq!(ConsoleReporter::iteration_line(&failure), failure.to_string());
    }

    #[test]
    fn test_banner_mentions_fault_rates() {
        let _colors = plain();
        let lines = ConsoleReporter::banner_lines(&SimulationConfig::default());
        assert_eq!(lines[0], "Starting Traffic Simulation...");
        assert_eq!(lines[1], "Sending navigation requests to ART every 2 seconds.");
        assert_eq!(lines[2], "Fault injection: 20% errors, 20% slow queries.");
        assert!(lines[3].contains("Ctrl+C"));
    }

    #[test]
    fn test_startup_failure_lines() {
        let _colors = plain();
        assert_eq!(
            ConsoleReporter::startup_failure_line(&SimError::vector_store_unavailable("none")),
            "Vector store unavailable. Cannot inject faults or run traffic."
        );
        assert_eq!(
            ConsoleReporter::startup_failure_line(&SimError::initialization("Qdrant client: bad")),
            "Error initializing ART: Initialization error: Qdrant client: bad"
        );
    }

    #[test]
    fn test_status_colors() {
        let _colors = colors(true);

        assert_eq!(
            ConsoleReporter::iteration_line(&report(1, QueryStatus::Success)),
            "[1] 'Can we get a navigation check?' -> \u{1b}[32mSUCCESS\u{1b}[0m"
        );
        assert_eq!(
            ConsoleReporter::iteration_line(&report(2, QueryStatus::Unknown)),
            "[2] 'Can we get a navigation check?' -> \u{1b}[33mUNKNOWN\u{1b}[0m"
        );
        assert_eq!(
            ConsoleReporter::iteration_line(&report(
                3,
                QueryStatus::Error("Timeout error: unreachable".to_string())
            )),
            "[3] 'Can we get a navigation check?' -> \u{1b}[31mERROR\u{1b}[0m (Timeout error: unreachable)"
        );

        colored::control::unset_override();
    }
}
