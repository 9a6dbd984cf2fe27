//! Compares the ring decoded from a builder file with the ring parsed from the report of
//! `swift-ring-builder`, which describe the same ring through two independent paths.

use std::fmt::Display;

use artisan_api::ring::{DeviceInfo, RingInfo};

/// Tolerance for values the report prints with two decimals.
const REPORT_TOLERANCE: f64 = 0.005;

/// Tolerance for values the report prints with six decimals.
const PRECISE_TOLERANCE: f64 = 0.000001;

#[derive(Default)]
struct Differences(Vec<String>);

impl Differences {
    fn exact<T: PartialEq + Display>(&mut self, field: &str, report: T, builder: T) {
        if report != builder {
            self.0.push(format!("{field}: report {report}, builder {builder}"));
        }
    }

    fn approx(&mut self, field: &str, report: f64, builder: f64, tolerance: f64) {
        if (report - builder).abs() > tolerance {
            self.0.push(format!("{field}: report {report}, builder {builder}"));
        }
    }

    fn device(&mut self, report: &DeviceInfo, builder: &DeviceInfo) {
        let prefix = format!("device {}", report.id);
        self.exact(&format!("{prefix} id"), report.id, builder.id);
        self.exact(&format!("{prefix} region"), report.region, builder.region);
        self.exact(&format!("{prefix} zone"), report.zone, builder.zone);
        self.exact(&format!("{prefix} ip"), &report.ip, &builder.ip);
        self.exact(&format!("{prefix} port"), report.port, builder.port);
        self.exact(
            &format!("{prefix} replication ip"),
            &report.replication_ip,
            &builder.replication_ip,
        );
        self.exact(
            &format!("{prefix} replication port"),
            report.replication_port,
            builder.replication_port,
        );
        self.exact(&format!("{prefix} name"), &report.name, &builder.name);
        self.approx(
            &format!("{prefix} weight"),
            report.weight,
            builder.weight,
            REPORT_TOLERANCE,
        );
        self.exact(
            &format!("{prefix} partitions"),
            report.partitions,
            builder.partitions,
        );
        if report.meta != builder.meta {
            self.0.push(format!(
                "{prefix} meta: report {:?}, builder {:?}",
                report.meta, builder.meta
            ));
        }
    }
}

/// Lists every field in which the two rings differ.
///
/// The file name, balance and remaining reassignment time are ignored: the builder file does not
/// record the balance, and the remaining time changes between the two reads.
pub fn compare(report: &RingInfo, builder: &RingInfo) -> Vec<String> {
    let mut differences = Differences::default();

    differences.exact("version", report.version, builder.version);
    differences.exact("id", &report.id, &builder.id);
    differences.exact("partitions", report.partitions, builder.partitions);
    differences.approx(
        "replicas",
        report.replicas,
        builder.replicas,
        PRECISE_TOLERANCE,
    );
    differences.exact("regions", report.regions, builder.regions);
    differences.exact("zones", report.zones, builder.zones);
    differences.exact("device count", report.device_count, builder.device_count);
    differences.approx(
        "dispersion",
        report.dispersion,
        builder.dispersion,
        REPORT_TOLERANCE,
    );
    differences.exact(
        "reassign cooldown",
        report.reassigned_cooldown,
        builder.reassigned_cooldown,
    );
    differences.approx(
        "overload percent",
        report.overload_factor_percent,
        builder.overload_factor_percent,
        REPORT_TOLERANCE,
    );
    differences.approx(
        "overload",
        report.overload_factor_decimal,
        builder.overload_factor_decimal,
        PRECISE_TOLERANCE,
    );

    differences.exact("devices", report.devices.len(), builder.devices.len());
    for (report_device, builder_device) in report.devices.iter().zip(&builder.devices) {
        differences.device(report_device, builder_device);
    }

    differences.0
}

#[cfg(test)]
mod tests {
    use maplit::btreemap;

    use super::*;

    fn ring() -> RingInfo {
        let mut ring = RingInfo {
            file_name: "object.builder".into(),
            version: 7,
            id: "024e79c994c643d09eb045d488dafb94".into(),
            partitions: 1024,
            replicas: 3.0,
            overload_factor_percent: 10.0,
            overload_factor_decimal: 0.1,
            reassigned_cooldown: 24,
            devices: vec![DeviceInfo {
                id: 0,
                region: 1,
                zone: 1,
                ip: "10.114.1.202".into(),
                port: 6001,
                replication_ip: "10.114.1.202".into(),
                replication_port: 6001,
                name: "swift-01".into(),
                weight: 166.0,
                partitions: 3072,
                ..Default::default()
            }],
            ..Default::default()
        };
        ring.count_devices();
        ring
    }

    #[test]
    fn test_compare_equal() {
        let report = ring();
        let mut builder = ring();
        // Ignored or within what the report rounds away
        builder.file_name = "/etc/swift/object.builder".into();
        builder.balance = 12.0;
        builder.reassigned_remaining = 3600;
        builder.devices[0].balance = 1.5;
        builder.devices[0].weight = 166.004;
        builder.dispersion = 0.001;

        assert!(compare(&report, &builder).is_empty());
    }

    #[test]
    fn test_compare_differences() {
        let report = ring();
        let mut builder = ring();
        builder.version = 8;
        builder.overload_factor_decimal = 0.2;
        builder.devices[0].weight = 100.0;
        builder.devices[0].meta = Some(btreemap! { "rack".to_string() => "r1".to_string() });

        assert_eq!(
            compare(&report, &builder),
            vec![
                "version: report 7, builder 8",
                "overload: report 0.1, builder 0.2",
                "device 0 weight: report 166, builder 100",
                r#"device 0 meta: report None, builder Some({"rack": "r1"})"#,
            ]
        );

        builder.devices.clear();
        builder.count_devices();
        let differences = compare(&report, &builder);
        assert!(differences.contains(&"devices: report 1, builder 0".to_string()));
        assert!(differences.contains(&"device count: report 1, builder 0".to_string()));
    }
}
