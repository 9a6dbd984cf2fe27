use std::{fs, io::Read, path::PathBuf};

use log::info;

use artisan_api::{
    error::{ArtisanError, ArtisanResultExt, InvalidInputError, ReportError},
    ring::RingInfo,
};
use ringutils::builder_output;

use crate::{cli::OutputFormat, files, snapshot};

/// Everything `parse` needs to know, taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct Parse {
    pub file: Option<PathBuf>,
    pub builder: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

impl Parse {
    /// Writes the ring snapshot. The report is read from `stdin` when neither a report file nor a
    /// builder file is given.
    pub fn run<R: Read>(&self, stdin: &mut R) -> Result<(), ArtisanError> {
        let ring = self.read_ring(stdin)?;
        info!(
            "Parsed ring '{}' with {} devices",
            ring.file_name,
            ring.devices.len()
        );
        files::write_output(self.output.as_deref(), &files::render(&ring, self.format)?)
    }

    fn read_ring<R: Read>(&self, stdin: &mut R) -> Result<RingInfo, ArtisanError> {
        if let Some(builder) = &self.builder {
            return snapshot::load_builder(builder).message("Failed to load builder file");
        }

        let report = match &self.file {
            Some(file) => {
                fs::read_to_string(file).structured(InvalidInputError::ReadInputFile {
                    path: file.display().to_string(),
                })?
            }
            None => {
                let mut report = String::new();
                stdin
                    .read_to_string(&mut report)
                    .structured(InvalidInputError::ReadInputFile {
                        path: "<stdin>".into(),
                    })?;
                report
            }
        };

        builder_output::parse(&report).structured(InvalidInputError::ParseBuilderOutput)
    }
}
