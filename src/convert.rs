use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

use log::{info, warn};

use artisan_api::{
    config::{NodeRules, RingRules, ZoneRules},
    constants::{device_name, DEVICE_NAME_PREFIX, SUPPORTED_REGION},
    error::{ArtisanError, ArtisanResultExt},
    ring::{DeviceInfo, RingInfo},
};

use crate::{cli::OutputFormat, files, snapshot};

/// Everything `convert` needs to know, taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct Convert {
    pub input: Option<PathBuf>,
    pub builder: Option<PathBuf>,
    pub base_port: Option<u64>,
    pub base_size_tb: Option<f64>,
    pub output: Option<PathBuf>,
}

impl Convert {
    pub fn run(&self) -> Result<(), ArtisanError> {
        let ring = snapshot::load_ring(self.input.as_deref(), self.builder.as_deref())
            .message("Failed to load ring")?;
        let rules = convert(&ring, self.base_port, self.base_size_tb);
        info!(
            "Converted {} devices into rules for {} zones",
            ring.devices.len(),
            rules.zones.len()
        );
        files::write_output(
            self.output.as_deref(),
            &files::render(&rules, OutputFormat::Yaml)?,
        )
    }
}

/// Returns the disk index encoded in a device name, if it follows the naming scheme.
fn disk_index(name: &str) -> Option<u64> {
    let index = name.strip_prefix(DEVICE_NAME_PREFIX)?.parse().ok()?;
    (index > 0 && device_name(index) == name).then_some(index)
}

/// Derives the rules of a single node from its devices.
fn node_rules(ip: &str, devices: &[&DeviceInfo], base_port: Option<u64>) -> NodeRules {
    let first = devices[0];

    let mut indices = BTreeSet::new();
    for device in devices {
        match disk_index(&device.name) {
            Some(index) => {
                indices.insert(index);
            }
            None => warn!(
                "Device '{}' on node '{ip}' does not follow the naming scheme '{DEVICE_NAME_PREFIX}NN' and cannot be declared",
                device.name
            ),
        }
        if device.weight != first.weight {
            warn!(
                "Devices on node '{ip}' have different weights, using {} of '{}'",
                first.weight, first.name
            );
        }
        if device.port != first.port {
            warn!(
                "Devices on node '{ip}' use different ports, using {} of '{}'",
                first.port, first.name
            );
        }
        if device.meta != first.meta {
            warn!(
                "Devices on node '{ip}' have different meta, using the one of '{}'",
                first.name
            );
        }
    }

    let disk_count = indices.last().copied().unwrap_or_default();
    let mut rules = NodeRules {
        disk_count,
        weight: Some(first.weight),
        meta: first.meta.clone(),
        // Gaps in the numbering are declared broken, so they are not added
        broken_disks: (1..=disk_count)
            .filter(|index| !indices.contains(index))
            .map(device_name)
            .collect(),
        ..Default::default()
    };
    if rules.port(base_port) != first.port {
        rules.port = Some(first.port);
    }
    rules
}

/// Bootstraps ring rules that describe the given ring as it is.
pub fn convert(ring: &RingInfo, base_port: Option<u64>, base_size_tb: Option<f64>) -> RingRules {
    let mut nodes: BTreeMap<u64, BTreeMap<&str, Vec<&DeviceInfo>>> = BTreeMap::new();
    for device in &ring.devices {
        nodes
            .entry(device.zone)
            .or_default()
            .entry(device.ip.as_str())
            .or_default()
            .push(device);
    }

    let zones = nodes
        .into_iter()
        .map(|(zone, nodes)| {
            let nodes = nodes
                .into_iter()
                .map(|(ip, devices)| (ip.to_string(), node_rules(ip, &devices, base_port)))
                .collect();
            (zone, ZoneRules { nodes })
        })
        .collect();

    RingRules {
        base_size_tb,
        base_port,
        region: SUPPORTED_REGION,
        overload: ring.overload_factor_decimal,
        zones,
    }
}

#[cfg(test)]
mod tests {
    use maplit::btreemap;

    use crate::reconcile::calculate_changes;

    use super::*;

    fn device(zone: u64, ip: &str, port: u64, name: &str, weight: f64) -> DeviceInfo {
        DeviceInfo {
            region: 1,
            zone,
            ip: ip.into(),
            port,
            replication_ip: ip.into(),
            replication_port: port,
            name: name.into(),
            weight,
            ..Default::default()
        }
    }

    fn ring() -> RingInfo {
        let mut devices = vec![
            device(1, "10.114.1.202", 6001, "swift-01", 100.0),
            device(1, "10.114.1.202", 6001, "swift-02", 100.0),
            device(1, "10.114.1.203", 6002, "swift-01", 166.0),
            device(1, "10.114.1.203", 6002, "swift-03", 166.0),
            device(2, "10.114.1.204", 6001, "swift-01", 0.0),
        ];
        devices[4].meta = Some(btreemap! { "rack".to_string() => "r1".to_string() });
        let mut ring = RingInfo {
            file_name: "object.builder".into(),
            overload_factor_decimal: 0.1,
            overload_factor_percent: 10.0,
            devices,
            ..Default::default()
        };
        ring.count_devices();
        ring
    }

    #[test]
    fn test_convert() {
        let rules = convert(&ring(), Some(6001), Some(6.0));
        assert_eq!(
            rules,
            RingRules {
                base_size_tb: Some(6.0),
                base_port: Some(6001),
                region: 1,
                overload: 0.1,
                zones: btreemap! {
                    1 => ZoneRules {
                        nodes: btreemap! {
                            "10.114.1.202".to_string() => NodeRules {
                                disk_count: 2,
                                weight: Some(100.0),
                                ..Default::default()
                            },
                            "10.114.1.203".to_string() => NodeRules {
                                disk_count: 3,
                                weight: Some(166.0),
                                port: Some(6002),
                                broken_disks: vec!["swift-02".into()],
                                ..Default::default()
                            },
                        },
                    },
                    2 => ZoneRules {
                        nodes: btreemap! {
                            "10.114.1.204".to_string() => NodeRules {
                                disk_count: 1,
                                weight: Some(0.0),
                                meta: Some(btreemap! { "rack".to_string() => "r1".to_string() }),
                                ..Default::default()
                            },
                        },
                    },
                },
            }
        );
    }

    #[test]
    fn test_convert_without_base_port() {
        let rules = convert(&ring(), None, None);
        // Every node differs from the default port
        assert_eq!(rules.zones[&1].nodes["10.114.1.202"].port, Some(6001));

        let mut ring = ring();
        for device in &mut ring.devices {
            device.port = 6000;
            device.replication_port = 6000;
        }
        let rules = convert(&ring, None, None);
        assert_eq!(rules.zones[&1].nodes["10.114.1.202"].port, None);
    }

    #[test]
    fn test_converted_rules_apply_cleanly() {
        let ring = ring();
        for base_port in [None, Some(6001), Some(6002)] {
            let rules = convert(&ring, base_port, None);
            let changes = calculate_changes(&ring, &rules, "object.builder").unwrap();
            assert!(changes.is_empty(), "{:?}", changes.rendered());
            assert!(changes.confirmations.is_empty());
        }
    }

    #[test]
    fn test_disk_index() {
        assert_eq!(disk_index("swift-01"), Some(1));
        assert_eq!(disk_index("swift-12"), Some(12));
        assert_eq!(disk_index("swift-1"), None);
        assert_eq!(disk_index("swift-00"), None);
        assert_eq!(disk_index("sdb"), None);
    }

    #[test]
    fn test_rules_serialization() {
        let yaml = files::render(&convert(&ring(), Some(6001), None), OutputFormat::Yaml).unwrap();
        let parsed: RingRules = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, convert(&ring(), Some(6001), None));
        assert!(!yaml.contains("base_size_tb"));
        assert!(!yaml.contains("disk_size_tb"));
    }
}
