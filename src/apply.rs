use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use log::{debug, info, warn};

use artisan_api::{
    command::{RingAction, RingCommand},
    error::{ArtisanError, ArtisanResultExt, InvalidInputError},
};
use ringutils::{dependencies::DependencyResultExt, swift_ring_builder};

use crate::{
    files, prompt,
    reconcile::{self, ChangeSet},
    snapshot, ExitKind,
};

/// Everything `apply` needs to know, taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct Apply {
    pub rule: PathBuf,
    pub input: Option<PathBuf>,
    pub builder: Option<PathBuf>,
    pub check: bool,
    pub execute: bool,
    pub assume_yes: bool,
    pub output: Option<PathBuf>,
    pub rebalance: bool,
}

impl Apply {
    /// Reconciles the ring with the rule file. Confirmations are asked on `output` and answered
    /// from `input`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<ExitKind, ArtisanError> {
        let rules = files::read_rules(&self.rule).message("Failed to load rule file")?;
        let ring = snapshot::load_ring(self.input.as_deref(), self.builder.as_deref())
            .message("Failed to load ring")?;

        let builder_file = match &self.builder {
            Some(builder) => builder.display().to_string(),
            None => ring.file_name.clone(),
        };

        let changes = reconcile::calculate_changes(&ring, &rules, &builder_file)
            .map_err(ArtisanError::from)
            .message("Failed to calculate changes")?;

        if self.check {
            return Ok(check(&changes));
        }

        if !changes.confirmations.is_empty() {
            if self.assume_yes {
                for confirmation in &changes.confirmations {
                    warn!("Assuming yes: {confirmation}");
                }
            } else if !prompt::confirm_all(&changes.confirmations, input, output)? {
                return Err(ArtisanError::new(InvalidInputError::ConfirmationDeclined));
            }
        }

        if !self.execute {
            let mut rendered = changes.rendered().join("\n");
            if !rendered.is_empty() {
                rendered.push('\n');
            }
            return files::write_output(self.output.as_deref(), &rendered).map(|()| ExitKind::Done);
        }

        if self.builder.is_none() {
            return Err(ArtisanError::new(InvalidInputError::MissingBuilderFile));
        }
        execute_changes(&changes, &builder_file, self.rebalance, |command| {
            swift_ring_builder::run(command).message(format!("Failed to run '{command}'"))
        })?;

        Ok(ExitKind::Done)
    }
}

fn check(changes: &ChangeSet) -> ExitKind {
    if changes.is_empty() {
        info!("Ring matches the rule file");
        return ExitKind::Done;
    }

    info!(
        "Ring does not match the rule file, {} commands are pending",
        changes.commands.len()
    );
    for command in &changes.commands {
        debug!("Pending: {command}");
    }
    ExitKind::ChangesPending
}

/// Runs every command of the change set in order and finishes with a rebalance, or with writing
/// the ring when only metadata changed.
pub fn execute_changes<F>(
    changes: &ChangeSet,
    builder_file: &str,
    rebalance: bool,
    mut run: F,
) -> Result<(), ArtisanError>
where
    F: FnMut(&RingCommand) -> Result<(), ArtisanError>,
{
    if changes.is_empty() {
        info!("Ring matches the rule file, nothing to execute");
        return Ok(());
    }

    for command in &changes.commands {
        info!("Executing '{command}'");
        run(command)?;
    }

    if !rebalance {
        info!("Skipping rebalance, the ring file is not updated");
        return Ok(());
    }

    let action = if changes.requires_rebalance() {
        RingAction::Rebalance
    } else {
        RingAction::WriteRing
    };
    let finish = RingCommand::new(builder_file, action);
    info!("Executing '{finish}'");
    run(&finish)
}
