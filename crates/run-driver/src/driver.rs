//! Run driver: ordered execution with bounded-loss durable commits

use experiment_core::{DriverConfig, Result, RunReport, RunStatus, UnitFailure};
use storage::{DurableVolume, OutputLayout};
use tracing::{debug, info, warn};

use crate::selector::UnitSelector;
use crate::unit::Unit;

/// Executes unit sequences against a durable volume
///
/// Commit policy: after every `commit_interval` successful units since
/// the last commit, additionally after any unit whose source matches a
/// completion marker, immediately after any unit failure, and
/// unconditionally once at the end of the run. At most one interval of
/// completed-but-uncommitted work can be lost to a kill.
pub struct RunDriver<'a> {
    layout: OutputLayout,
    volume: &'a dyn DurableVolume,
    config: DriverConfig,
}

impl<'a> RunDriver<'a> {
    /// Create a driver writing under `layout` and committing to `volume`
    pub fn new(
        layout: OutputLayout,
        volume: &'a dyn DurableVolume,
        config: DriverConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            layout,
            volume,
            config,
        })
    }

    /// Execute `units` in index order
    ///
    /// Control flow: select (when a selector is given), then execute each
    /// unit in turn (a failing unit is recorded and execution continues
    /// with the next), then a final commit. Nothing skips the final
    /// commit: it runs even when every unit failed, and even when the
    /// selector matched nothing (reported as
    /// [`RunStatus::TaskNotFound`]).
    ///
    /// With a selector match at `start..end`, the setup units before
    /// `start` run as well (they resume cheaply from existing
    /// checkpoints); units from `end` on are skipped.
    pub fn run(
        &self,
        units: &mut [Unit],
        selector: Option<&dyn UnitSelector>,
    ) -> Result<RunReport> {
        let limit = match selector {
            Some(selector) => match selector.select(units) {
                Some(range) => {
                    debug!(start = range.start, end = range.end, "Task filter matched");
                    range.end
                }
                None => {
                    warn!("Task filter matched no units, skipping execution");
                    self.commit("final")?;
                    return Ok(self.report(RunStatus::TaskNotFound, 0, Vec::new()));
                }
            },
            None => units.len(),
        };

        let mut executed = 0usize;
        let mut failures: Vec<UnitFailure> = Vec::new();
        let mut last_commit = 0usize;

        for (index, unit) in units.iter_mut().enumerate().take(limit) {
            debug!(index, "Executing unit");
            match unit.execute() {
                Ok(()) => {
                    executed += 1;

                    if executed - last_commit >= self.config.commit_interval {
                        self.commit("interval")?;
                        last_commit = executed;
                    }

                    if self.matches_completion(unit.source()) {
                        self.commit("task completion")?;
                        last_commit = executed;
                    }
                }
                Err(e) => {
                    warn!(index, error = %e, "Unit failed, continuing with next");
                    failures.push(UnitFailure {
                        index,
                        message: e.to_string(),
                    });
                    // Commit even on failure to keep partial outputs.
                    self.commit("unit failure")?;
                }
            }
        }

        self.commit("final")?;

        info!(
            executed,
            errors = failures.len(),
            output = %self.layout.root().display(),
            "Run complete"
        );

        Ok(self.report(RunStatus::Completed, executed, failures))
    }

    fn matches_completion(&self, source: &str) -> bool {
        let lower = source.to_lowercase();
        self.config
            .completion_markers
            .iter()
            .any(|marker| lower.contains(marker))
    }

    fn commit(&self, reason: &str) -> Result<()> {
        info!(reason, "Committing durable volume");
        self.volume.commit()
    }

    fn report(
        &self,
        status: RunStatus,
        units_executed: usize,
        failures: Vec<UnitFailure>,
    ) -> RunReport {
        RunReport {
            status,
            units_executed,
            error_count: failures.len(),
            failures,
            output_location: self.layout.root().to_path_buf(),
        }
    }
}
