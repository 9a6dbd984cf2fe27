//! Decoder for the builder files written by `swift-ring-builder`.
//!
//! A builder file is a pickled dictionary. Only the fields needed to describe the ring are decoded;
//! partition assignment tables and other internal state are skipped.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Error};
use log::debug;
use serde::Deserialize;
use serde_pickle::DeOptions;

use artisan_api::ring::{parse_device_meta, DeviceInfo, RingInfo};

#[derive(Deserialize, Debug)]
struct PickledBuilder {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    version: u64,
    parts: u64,
    replicas: f64,
    #[serde(default)]
    overload: f64,
    #[serde(default)]
    min_part_hours: u64,
    #[serde(default)]
    dispersion: Option<f64>,
    #[serde(default, rename = "_last_part_moves_epoch")]
    last_part_moves_epoch: Option<f64>,
    /// Removed devices leave a hole in the list, so that the index is always the device ID.
    #[serde(default)]
    devs: Vec<Option<PickledDevice>>,
}

#[derive(Deserialize, Debug)]
struct PickledDevice {
    id: u64,
    #[serde(default = "default_region")]
    region: u64,
    zone: u64,
    ip: String,
    port: u64,
    #[serde(default)]
    replication_ip: Option<String>,
    #[serde(default)]
    replication_port: Option<u64>,
    device: String,
    weight: f64,
    #[serde(default)]
    parts: u64,
    #[serde(default)]
    meta: Option<String>,
}

/// Builder files created before regions existed implicitly use region 1.
fn default_region() -> u64 {
    1
}

impl From<PickledDevice> for DeviceInfo {
    fn from(device: PickledDevice) -> Self {
        DeviceInfo {
            id: device.id,
            region: device.region,
            zone: device.zone,
            replication_ip: device.replication_ip.unwrap_or_else(|| device.ip.clone()),
            replication_port: device.replication_port.unwrap_or(device.port),
            ip: device.ip,
            port: device.port,
            name: device.device,
            weight: device.weight,
            partitions: device.parts,
            balance: 0.0,
            meta: device.meta.as_deref().and_then(parse_device_meta),
        }
    }
}

/// Reads and decodes the builder file at the given path.
pub fn read(path: impl AsRef<Path>) -> Result<RingInfo, Error> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open builder file '{}'", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    decode(BufReader::new(file), &file_name)
        .with_context(|| format!("Failed to decode builder file '{}'", path.display()))
}

/// Decodes a pickled builder into a ring snapshot.
///
/// Balance is not stored in the builder and is left at zero.
pub fn decode<R: Read>(reader: R, file_name: &str) -> Result<RingInfo, Error> {
    let builder: PickledBuilder = serde_pickle::from_reader(
        reader,
        DeOptions::new()
            .decode_strings()
            .replace_unresolved_globals(),
    )
    .context("Failed to unpickle builder")?;
    debug!(
        "Decoded builder '{file_name}' with {} device slots",
        builder.devs.len()
    );

    let mut ring = RingInfo {
        file_name: file_name.into(),
        version: builder.version,
        id: builder.id.unwrap_or_default(),
        partitions: builder.parts,
        replicas: builder.replicas,
        dispersion: builder.dispersion.unwrap_or_default(),
        reassigned_cooldown: builder.min_part_hours,
        reassigned_remaining: remaining_seconds(
            builder.min_part_hours,
            builder.last_part_moves_epoch,
        ),
        overload_factor_percent: builder.overload * 100.0,
        overload_factor_decimal: builder.overload,
        devices: builder
            .devs
            .into_iter()
            .flatten()
            .map(DeviceInfo::from)
            .collect(),
        ..Default::default()
    };
    ring.count_devices();

    Ok(ring)
}

/// Seconds until partitions may be moved again, counted from the last time they were moved.
fn remaining_seconds(min_part_hours: u64, last_moves_epoch: Option<f64>) -> u64 {
    let Some(epoch) = last_moves_epoch else {
        return 0;
    };
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default();
    let elapsed = (now - epoch).max(0.0) as u64;
    (min_part_hours * 3600).saturating_sub(elapsed)
}
