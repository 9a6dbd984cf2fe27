use std::path::Path;

use anyhow::anyhow;
use log::{debug, info, warn};

use artisan_api::{
    error::{ArtisanError, ArtisanResultExt, ExecutionError, InvalidInputError, ReportError},
    ring::RingInfo,
};
use ringutils::{
    builder_file, builder_output,
    dependencies::{Dependency, DependencyResultExt},
    swift_ring_builder,
};

use crate::{consistency, files};

/// Loads the observed ring, preferring a snapshot file over decoding the builder file.
pub fn load_ring(
    snapshot: Option<&Path>,
    builder: Option<&Path>,
) -> Result<RingInfo, ArtisanError> {
    match (snapshot, builder) {
        (Some(snapshot), _) => files::read_snapshot(snapshot),
        (None, Some(builder)) => load_builder(builder),
        (None, None) => Err(ArtisanError::new(InvalidInputError::MissingRingSource)),
    }
}

/// Decodes a builder file. When `swift-ring-builder` is installed, its report on the same file is
/// parsed as well and both results have to agree.
pub fn load_builder(builder: &Path) -> Result<RingInfo, ArtisanError> {
    let ring = builder_file::read(builder).structured(InvalidInputError::DecodeBuilderFile {
        path: builder.display().to_string(),
    })?;

    if !Dependency::SwiftRingBuilder.exists() {
        debug!(
            "Did not find '{}', skipping consistency check",
            Dependency::SwiftRingBuilder
        );
        return Ok(ring);
    }

    let report =
        swift_ring_builder::describe(builder).message("Failed to describe builder file")?;
    let reported =
        builder_output::parse(&report).structured(InvalidInputError::ParseBuilderOutput)?;

    let differences = consistency::compare(&reported, &ring);
    if !differences.is_empty() {
        for difference in &differences {
            warn!("{difference}");
        }
        return Err(ArtisanError::with_source(
            ExecutionError::SnapshotMismatch,
            anyhow!(differences.join("\n")),
        ))
        .message(format!(
            "Builder file '{}' and its report disagree",
            builder.display()
        ));
    }

    info!("Builder file '{}' matches its report", builder.display());
    Ok(ring)
}

#[cfg(test)]
mod tests {
    use artisan_api::error::ErrorKind;

    use super::*;

    #[test]
    fn test_missing_source() {
        assert_eq!(
            load_ring(None, None).unwrap_err().kind(),
            &ErrorKind::InvalidInput(InvalidInputError::MissingRingSource)
        );
    }

    #[test]
    fn test_snapshot_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("snapshot.yaml");
        std::fs::write(&snapshot, "file_name: object.builder\nregions: 1\n").unwrap();

        // The builder file is not touched when a snapshot is given
        let ring = load_ring(Some(&snapshot), Some(Path::new("/does/not/exist.builder"))).unwrap();
        assert_eq!(ring.file_name, "object.builder");
        assert_eq!(ring.regions, 1);
    }

    #[test]
    fn test_undecodable_builder() {
        let dir = tempfile::tempdir().unwrap();
        let builder = dir.path().join("object.builder");
        std::fs::write(&builder, "garbage").unwrap();

        assert_eq!(
            load_ring(None, Some(&builder)).unwrap_err().kind(),
            &ErrorKind::InvalidInput(InvalidInputError::DecodeBuilderFile {
                path: builder.display().to_string()
            })
        );
    }
}
