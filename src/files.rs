use std::{fs, path::Path};

use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};

use artisan_api::{
    config::RingRules,
    error::{ArtisanError, ExecutionError, InternalError, InvalidInputError, ReportError},
    ring::RingInfo,
};

use crate::cli::OutputFormat;

fn read_input(path: &Path) -> Result<String, ArtisanError> {
    debug!("Reading '{}'", path.display());
    fs::read_to_string(path).structured(InvalidInputError::ReadInputFile {
        path: path.display().to_string(),
    })
}

fn parse_yaml<T: DeserializeOwned>(
    path: &Path,
    error: impl FnOnce(String) -> InvalidInputError,
) -> Result<T, ArtisanError> {
    let contents = read_input(path)?;
    serde_yaml::from_str(&contents).structured(error(path.display().to_string()))
}

/// Reads a rule file. Unknown keys are rejected.
pub fn read_rules(path: impl AsRef<Path>) -> Result<RingRules, ArtisanError> {
    parse_yaml(path.as_ref(), |path| InvalidInputError::ParseRingRules { path })
}

/// Reads a ring snapshot as written by the `parse` subcommand. As YAML is a superset of JSON, both
/// formats are accepted.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<RingInfo, ArtisanError> {
    parse_yaml(path.as_ref(), |path| InvalidInputError::ParseRingSnapshot {
        path,
    })
}

/// Serializes a document in the requested format.
pub fn render<T: Serialize>(document: &T, format: OutputFormat) -> Result<String, ArtisanError> {
    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(document).structured(InternalError::SerializeOutput)
        }
        OutputFormat::Json => serde_json::to_string_pretty(document)
            .map(|json| json + "\n")
            .structured(InternalError::SerializeOutput),
    }
}

/// Writes the output to the given file, or to stdout when no file is given.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<(), ArtisanError> {
    match path {
        Some(path) => {
            info!("Writing to '{}'", path.display());
            fs::write(path, contents).structured(ExecutionError::WriteOutput {
                path: path.display().to_string(),
            })
        }
        None => {
            print!("{contents}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use artisan_api::error::ErrorKind;

    use super::*;

    #[test]
    fn test_read_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        fs::write(
            &path,
            indoc! {r#"
                region: 1
                base_port: 6001
                zones:
                  1:
                    nodes:
                      10.114.1.202:
                        disk_count: 3
                        weight: 100
            "#},
        )
        .unwrap();

        let rules = read_rules(&path).unwrap();
        assert_eq!(rules.region, 1);
        assert_eq!(rules.zones[&1].nodes["10.114.1.202"].disk_count, 3);

        fs::write(&path, "region: 1\nunknown: true\n").unwrap();
        let error = read_rules(&path).unwrap_err();
        assert_eq!(
            error.kind(),
            &ErrorKind::InvalidInput(InvalidInputError::ParseRingRules {
                path: path.display().to_string()
            })
        );

        let missing = dir.path().join("missing.yaml");
        assert_eq!(
            read_rules(&missing).unwrap_err().kind(),
            &ErrorKind::InvalidInput(InvalidInputError::ReadInputFile {
                path: missing.display().to_string()
            })
        );
    }

    #[test]
    fn test_snapshot_formats() {
        let ring = RingInfo {
            file_name: "object.builder".into(),
            regions: 1,
            overload_factor_decimal: 0.1,
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();

        for format in [OutputFormat::Yaml, OutputFormat::Json] {
            let path = dir.path().join("snapshot");
            write_output(Some(&path), &render(&ring, format).unwrap()).unwrap();
            assert_eq!(read_snapshot(&path).unwrap(), ring);
        }
    }

    #[test]
    fn test_write_output_failure() {
        let error = write_output(Some(Path::new("/does/not/exist/out")), "x").unwrap_err();
        assert_eq!(error.category(), "execution");
    }
}
