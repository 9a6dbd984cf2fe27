//! Parser for the human readable report printed by `swift-ring-builder <builder file>`.

use std::str::FromStr;

use anyhow::{bail, Context, Error};
use lazy_static::lazy_static;
use log::trace;
use regex::{Captures, Regex};

use artisan_api::ring::{parse_device_meta, DeviceInfo, RingInfo};

lazy_static! {
    /// Matches the following line:
    /// container.builder, build version 7, id 024e79c994c643d09eb045d488dafb94
    static ref FILE_INFO_REGEX: Regex = Regex::new(
        r"^(?:[\w/.-]+/)?(?P<file_name>[\w.-]+\.builder), build version (?P<version>\d+), id (?P<id>\w{32})$"
    )
    .expect("Failed to compile regex");

    /// Matches the following line:
    /// 1024 partitions, 3.000000 replicas, 1 regions, 1 zones, 6 devices, 0.00 balance, 0.00 dispersion
    static ref STATS_REGEX: Regex = Regex::new(
        r"^(?P<partitions>\d+) partitions, (?P<replicas>\d+\.\d+) replicas, (?P<regions>\d+) regions, (?P<zones>\d+) zones, (?P<device_count>\d+) devices, (?P<balance>\d+\.\d+) balance, (?P<dispersion>\d+\.\d+) dispersion$"
    )
    .expect("Failed to compile regex");

    /// Matches the following line:
    /// The minimum number of hours before a partition can be reassigned is 24 (0:00:00 remaining)
    static ref REASSIGN_REGEX: Regex = Regex::new(
        r"^The minimum number of hours before a partition can be reassigned is (?P<cooldown>\d+) \((?P<hours>\d+):(?P<minutes>\d{2}):(?P<seconds>\d{2}) remaining\)$"
    )
    .expect("Failed to compile regex");

    /// Matches the following line:
    /// The overload factor is 10.00% (0.100000)
    static ref OVERLOAD_REGEX: Regex = Regex::new(
        r"^The overload factor is (?P<percent>\d+\.\d+)% \((?P<decimal>\d+\.\d+)\)$"
    )
    .expect("Failed to compile regex");

    /// Matches purely informational lines about the ring file, e.g.:
    /// Ring file container.ring.gz is obsolete
    /// Ring file container.ring.gz is up-to-date
    static ref RING_FILE_REGEX: Regex = Regex::new(
        r"^Ring file (?:[\w/.-]+/)?[\w.-]+\.ring\.gz (?:is (?:obsolete|up-to-date)|not found, probably it hasn't been written yet)$"
    )
    .expect("Failed to compile regex");

    /// Matches the header of the device table:
    /// Devices:   id region zone   ip address:port replication ip:port  name weight partitions balance flags meta
    static ref TABLE_HEADER_REGEX: Regex = Regex::new(
        r"^Devices:\s+id\s+region\s+zone\s+ip address:port\s+replication ip:port\s+name\s+weight\s+partitions\s+balance\s+flags\s+meta$"
    )
    .expect("Failed to compile regex");

    /// Matches a row of the device table, with optional flags and meta columns:
    ///            0      1    1 10.114.1.202:6001   10.114.1.202:6001 swift-01 100.00        512    0.00
    ///          111      1    1  10.46.14.44:6001    10.46.14.44:6001 swift-33 100.00         78   -0.98
    static ref DEVICE_ROW_REGEX: Regex = Regex::new(
        r"^\s+(?P<id>\d+)\s+(?P<region>\d+)\s+(?P<zone>\d+)\s+(?P<ip>(?:\d+\.){3}\d+):(?P<port>\d+)\s+(?P<replication_ip>(?:\d+\.){3}\d+):(?P<replication_port>\d+)\s+(?P<name>[\w+-]+)\s+(?P<weight>\d+\.\d+)\s+(?P<partitions>\d+)\s+(?P<balance>-?\d+\.\d+)(?:\s+(?P<flags>DEL))?(?:\s+(?P<meta>\S.*?))?\s*$"
    )
    .expect("Failed to compile regex");
}

/// Extracts and parses a named capture group.
fn capture<T>(captures: &Captures, name: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = captures
        .name(name)
        .with_context(|| format!("Missing capture group '{name}'"))?
        .as_str();
    value
        .parse()
        .with_context(|| format!("Failed to parse '{value}' as {name}"))
}

/// Parses the report printed by `swift-ring-builder` into a ring snapshot.
///
/// The report consists of a fixed set of header lines, the device table header and one line per
/// device. Any line that is not understood is an error.
pub fn parse(output: &str) -> Result<RingInfo, Error> {
    let mut ring = RingInfo::default();
    let mut lines = output.lines();

    let mut found_table = false;
    for line in lines.by_ref() {
        trace!("Processing line: {line}");
        if line.trim().is_empty() {
            continue;
        }

        if let Some(captures) = FILE_INFO_REGEX.captures(line) {
            ring.file_name = captures["file_name"].to_string();
            ring.version = capture(&captures, "version")?;
            ring.id = captures["id"].to_string();
        } else if let Some(captures) = STATS_REGEX.captures(line) {
            ring.partitions = capture(&captures, "partitions")?;
            ring.replicas = capture(&captures, "replicas")?;
            ring.regions = capture(&captures, "regions")?;
            ring.zones = capture(&captures, "zones")?;
            ring.device_count = capture(&captures, "device_count")?;
            ring.balance = capture(&captures, "balance")?;
            ring.dispersion = capture(&captures, "dispersion")?;
        } else if let Some(captures) = REASSIGN_REGEX.captures(line) {
            ring.reassigned_cooldown = capture(&captures, "cooldown")?;
            ring.reassigned_remaining = capture::<u64>(&captures, "hours")? * 3600
                + capture::<u64>(&captures, "minutes")? * 60
                + capture::<u64>(&captures, "seconds")?;
        } else if let Some(captures) = OVERLOAD_REGEX.captures(line) {
            ring.overload_factor_percent = capture(&captures, "percent")?;
            ring.overload_factor_decimal = capture(&captures, "decimal")?;
        } else if RING_FILE_REGEX.is_match(line) {
            // Informational only
        } else if TABLE_HEADER_REGEX.is_match(line) {
            found_table = true;
            break;
        } else {
            bail!("A header regex did not match the line: '{line}'");
        }
    }

    if !found_table {
        bail!("Failed to find the device table");
    }

    for line in lines {
        trace!("Processing line: {line}");
        if line.trim().is_empty() {
            continue;
        }

        let captures = DEVICE_ROW_REGEX
            .captures(line)
            .with_context(|| format!("The device table regex did not match the line: '{line}'"))?;
        ring.devices.push(parse_device(&captures)?);
    }

    Ok(ring)
}

fn parse_device(captures: &Captures) -> Result<DeviceInfo, Error> {
    Ok(DeviceInfo {
        id: capture(captures, "id")?,
        region: capture(captures, "region")?,
        zone: capture(captures, "zone")?,
        ip: captures["ip"].to_string(),
        port: capture(captures, "port")?,
        replication_ip: captures["replication_ip"].to_string(),
        replication_port: capture(captures, "replication_port")?,
        name: captures["name"].to_string(),
        weight: capture(captures, "weight")?,
        partitions: capture(captures, "partitions")?,
        balance: capture(captures, "balance")?,
        meta: captures
            .name("meta")
            .and_then(|meta| parse_device_meta(meta.as_str())),
    })
}
