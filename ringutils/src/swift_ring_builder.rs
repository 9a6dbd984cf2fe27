use std::path::Path;

use log::{debug, warn};

use artisan_api::command::{RingAction, RingCommand};

use crate::dependencies::{Dependency, DependencyError};

/// Exit code used by `swift-ring-builder` for warnings, e.g. when a rebalance did not reassign any
/// partition.
const EXIT_WARNING: i32 = 1;

/// Returns the report printed by `swift-ring-builder <builder file>`.
pub fn describe(builder_file: impl AsRef<Path>) -> Result<String, Box<DependencyError>> {
    Dependency::SwiftRingBuilder
        .cmd()
        .arg(builder_file.as_ref())
        .output_and_check()
}

/// Runs a single command against its builder file.
pub fn run(command: &RingCommand) -> Result<(), Box<DependencyError>> {
    if matches!(command.action, RingAction::Rebalance) {
        return rebalance(&command.builder_file);
    }

    debug!("Running '{command}'");
    Dependency::SwiftRingBuilder
        .cmd()
        .args(command.args())
        .run_and_check()
}

/// Reassigns partitions of the given builder file and writes the ring file. A warning exit is
/// logged but not treated as a failure.
pub fn rebalance(builder_file: &str) -> Result<(), Box<DependencyError>> {
    let command = RingCommand::new(builder_file, RingAction::Rebalance);
    debug!("Running '{command}'");
    let output = Dependency::SwiftRingBuilder
        .cmd()
        .args(command.args())
        .output()?;
    if output.code() == Some(EXIT_WARNING) {
        warn!(
            "Rebalance of '{builder_file}' finished with a warning:\n{}",
            output.output_report()
        );
        return Ok(());
    }
    output.check()
}

/// Writes the ring file of the given builder file without reassigning partitions.
pub fn write_ring(builder_file: &str) -> Result<(), Box<DependencyError>> {
    run(&RingCommand::new(builder_file, RingAction::WriteRing))
}
