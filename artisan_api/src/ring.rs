use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// RingInfo is a snapshot of the state of a ring as reported by `swift-ring-builder`.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct RingInfo {
    /// Name of the builder file, e.g. `object.builder`.
    pub file_name: String,
    pub version: u64,
    pub id: String,

    pub partitions: u64,
    pub replicas: f64,
    pub regions: u64,
    pub zones: u64,
    pub device_count: u64,
    pub balance: f64,
    pub dispersion: f64,

    /// Minimum number of hours before a partition can be reassigned.
    pub reassigned_cooldown: u64,

    /// Seconds left until partitions can be reassigned again.
    pub reassigned_remaining: u64,

    pub overload_factor_percent: f64,
    pub overload_factor_decimal: f64,

    pub devices: Vec<DeviceInfo>,
}

impl RingInfo {
    /// Derives the region, zone and device counts from the devices of the ring.
    pub fn count_devices(&mut self) {
        self.regions = self
            .devices
            .iter()
            .map(|device| device.region)
            .collect::<BTreeSet<_>>()
            .len() as u64;
        self.zones = self
            .devices
            .iter()
            .map(|device| (device.region, device.zone))
            .collect::<BTreeSet<_>>()
            .len() as u64;
        self.device_count = self.devices.len() as u64;
    }
}

/// DeviceInfo describes a single disk of a ring.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct DeviceInfo {
    pub id: u64,
    pub region: u64,
    pub zone: u64,
    pub ip: String,
    pub port: u64,
    pub replication_ip: String,
    pub replication_port: u64,
    pub name: String,
    pub weight: f64,
    pub partitions: u64,
    pub balance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, String>>,
}

impl DeviceInfo {
    /// Checks whether replication traffic uses the same endpoint as regular traffic.
    pub fn has_matching_replication_endpoint(&self) -> bool {
        self.ip == self.replication_ip && self.port == self.replication_port
    }
}

/// Parses the free-form meta field of a device. Only a JSON object of strings is understood as
/// metadata, anything else (including an empty field) is treated as absent.
pub fn parse_device_meta(meta: &str) -> Option<BTreeMap<String, String>> {
    let meta = meta.trim();
    if meta.is_empty() {
        return None;
    }
    serde_json::from_str(meta).ok()
}
