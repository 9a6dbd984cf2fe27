use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
};

use serde_json::Value;
use strum_macros::IntoStaticStr;

use crate::{constants::SWIFT_RING_BUILDER, ring::DeviceInfo};

/// Identifies a device in a `swift-ring-builder` search expression.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSelector {
    pub region: u64,
    pub zone: u64,
    pub ip: String,
    pub port: u64,
    pub name: String,
}

impl From<&DeviceInfo> for DeviceSelector {
    fn from(device: &DeviceInfo) -> Self {
        Self {
            region: device.region,
            zone: device.zone,
            ip: device.ip.clone(),
            port: device.port,
            name: device.name.clone(),
        }
    }
}

impl DeviceSelector {
    fn push_args(&self, args: &mut Vec<String>) {
        args.extend([
            "--region".into(),
            self.region.to_string(),
            "--zone".into(),
            self.zone.to_string(),
            "--ip".into(),
            self.ip.clone(),
            "--port".into(),
            self.port.to_string(),
            "--device".into(),
            self.name.clone(),
        ]);
    }
}

/// A change to apply to a builder file.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RingAction {
    /// Adds a new device with the given weight and optional metadata.
    Add {
        device: DeviceSelector,
        weight: f64,
        meta: Option<BTreeMap<String, String>>,
    },

    /// Removes a device. The weight is only informational.
    Remove { device: DeviceSelector, weight: f64 },

    /// Changes the weight of a device from `current` to `desired`.
    SetWeight {
        device: DeviceSelector,
        current: f64,
        desired: f64,
    },

    /// Replaces the metadata of a device.
    SetInfo {
        device: DeviceSelector,
        meta: BTreeMap<String, String>,
    },

    /// Changes the overload factor of the ring.
    SetOverload { overload: f64 },

    /// Reassigns partitions after devices or weights changed.
    Rebalance,

    /// Writes the ring file without reassigning partitions.
    WriteRing,
}

/// A single `swift-ring-builder` invocation against a builder file.
#[derive(Debug, Clone, PartialEq)]
pub struct RingCommand {
    pub builder_file: String,
    pub action: RingAction,
}

impl RingCommand {
    pub fn new(builder_file: impl Into<String>, action: RingAction) -> Self {
        Self {
            builder_file: builder_file.into(),
            action,
        }
    }

    /// Returns the verb of the command, e.g. `set_weight`.
    pub fn verb(&self) -> &'static str {
        <&'static str>::from(&self.action)
    }

    /// Checks whether the command only changes device metadata, which does not require a
    /// rebalance of the ring.
    pub fn is_metadata_only(&self) -> bool {
        matches!(self.action, RingAction::SetInfo { .. })
    }

    /// Returns the arguments to pass to `swift-ring-builder`, starting with the builder file.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.builder_file.clone(), self.verb().into()];
        match &self.action {
            RingAction::Add {
                device,
                weight,
                meta,
            } => {
                device.push_args(&mut args);
                args.extend(["--weight".into(), weight.to_string()]);
                if let Some(meta) = meta {
                    args.extend(["--meta".into(), render_meta(meta)]);
                }
            }
            RingAction::Remove { device, weight } => {
                device.push_args(&mut args);
                args.extend(["--weight".into(), weight.to_string()]);
            }
            RingAction::SetWeight {
                device,
                current,
                desired,
            } => {
                device.push_args(&mut args);
                args.extend(["--weight".into(), current.to_string(), desired.to_string()]);
            }
            RingAction::SetInfo { device, meta } => {
                device.push_args(&mut args);
                args.extend(["--change-meta".into(), render_meta(meta)]);
            }
            RingAction::SetOverload { overload } => args.push(format!("{overload:.6}")),
            RingAction::Rebalance | RingAction::WriteRing => (),
        }
        args
    }
}

impl Display for RingCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}", SWIFT_RING_BUILDER, self.args().join(" "))
    }
}

/// Renders metadata as compact JSON with sorted keys.
fn render_meta(meta: &BTreeMap<String, String>) -> String {
    Value::Object(
        meta.iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect(),
    )
    .to_string()
}
