//! TSN configuration helpers.
//!
//! These assemble the structured payloads for PTP (IEEE 1588), the
//! Time-Aware Shaper (IEEE 802.1Qbv gate schedules), and the Credit-Based
//! Shaper (IEEE 802.1Qav), and push them through [`Device::yang_set`].

use crate::cbor::YangValue;
use crate::error::{Error, Result};

use super::Device;

/// Nanoseconds per second: the canonical cycle-time denominator.
pub const NS_PER_SEC: u32 = 1_000_000_000;

/// A PTP instance configuration (default data set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtpInstance {
    pub instance_index: u32,
    pub priority1: u8,
    pub priority2: u8,
    pub domain_number: u8,
    pub slave_only: bool,
}

impl Default for PtpInstance {
    fn default() -> Self {
        Self {
            instance_index: 0,
            priority1: 128,
            priority2: 128,
            domain_number: 0,
            slave_only: false,
        }
    }
}

impl PtpInstance {
    fn to_value(&self) -> YangValue {
        YangValue::map(vec![YangValue::entry(
            "instance",
            YangValue::Array(vec![YangValue::map(vec![
                YangValue::entry("instance-index", YangValue::uint(u64::from(self.instance_index))),
                YangValue::entry(
                    "default-ds",
                    YangValue::map(vec![
                        YangValue::entry("priority1", YangValue::uint(u64::from(self.priority1))),
                        YangValue::entry("priority2", YangValue::uint(u64::from(self.priority2))),
                        YangValue::entry(
                            "domain-number",
                            YangValue::uint(u64::from(self.domain_number)),
                        ),
                        YangValue::entry("slave-only", YangValue::Bool(self.slave_only)),
                    ]),
                ),
            ])]),
        )])
    }
}

/// One entry of a gate control list. The gate state is an 8-bit mask, one
/// bit per traffic class 0..7 (bit set = gate open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateControlEntry {
    pub gate_states: u8,
    pub time_interval_ns: u32,
}

/// A Qbv gate schedule for one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasSchedule {
    /// Interface name, e.g. `"1"`.
    pub interface: String,
    pub gate_enabled: bool,
    /// Gate mask applied outside the schedule.
    pub admin_gate_states: u8,
    /// Cycle time as a rational; a denominator of 10^9 means the numerator
    /// counts nanoseconds.
    pub cycle_time: (u32, u32),
    /// Schedule epoch: seconds and nanoseconds.
    pub base_time: (u64, u32),
    pub entries: Vec<GateControlEntry>,
}

impl TasSchedule {
    /// A schedule with everything open and a cycle of the given length in
    /// nanoseconds, to be refined with entries.
    pub fn new(interface: impl Into<String>, cycle_ns: u32) -> Self {
        Self {
            interface: interface.into(),
            gate_enabled: true,
            admin_gate_states: 0xFF,
            cycle_time: (cycle_ns, NS_PER_SEC),
            base_time: (0, 0),
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, gate_states: u8, time_interval_ns: u32) -> Self {
        self.entries.push(GateControlEntry {
            gate_states,
            time_interval_ns,
        });
        self
    }

    fn validate(&self) -> Result<()> {
        if self.cycle_time.1 == 0 {
            return Err(Error::Validation {
                path: "admin-cycle-time".into(),
                reason: "denominator must be non-zero".into(),
            });
        }
        if self.entries.is_empty() {
            return Err(Error::Validation {
                path: "admin-control-list".into(),
                reason: "schedule needs at least one entry".into(),
            });
        }
        let span: u64 = self
            .entries
            .iter()
            .map(|e| u64::from(e.time_interval_ns))
            .sum();
        // With the canonical denominator the entries must fit the cycle
        if self.cycle_time.1 == NS_PER_SEC && span > u64::from(self.cycle_time.0) {
            return Err(Error::Validation {
                path: "admin-control-list".into(),
                reason: format!(
                    "entries span {span} ns, longer than the {} ns cycle",
                    self.cycle_time.0
                ),
            });
        }
        Ok(())
    }

    fn to_value(&self) -> YangValue {
        let control_list = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                YangValue::map(vec![
                    YangValue::entry("index", YangValue::uint(index as u64)),
                    YangValue::entry("operation-name", YangValue::text("set-gate-states")),
                    YangValue::entry(
                        "gate-states-value",
                        YangValue::uint(u64::from(entry.gate_states)),
                    ),
                    YangValue::entry(
                        "time-interval-value",
                        YangValue::uint(u64::from(entry.time_interval_ns)),
                    ),
                ])
            })
            .collect();

        let table = YangValue::map(vec![
            YangValue::entry("gate-enabled", YangValue::Bool(self.gate_enabled)),
            YangValue::entry(
                "admin-gate-states",
                YangValue::uint(u64::from(self.admin_gate_states)),
            ),
            YangValue::entry(
                "admin-cycle-time",
                YangValue::map(vec![
                    YangValue::entry("numerator", YangValue::uint(u64::from(self.cycle_time.0))),
                    YangValue::entry("denominator", YangValue::uint(u64::from(self.cycle_time.1))),
                ]),
            ),
            YangValue::entry(
                "admin-base-time",
                YangValue::map(vec![
                    YangValue::entry("seconds", YangValue::uint(self.base_time.0)),
                    YangValue::entry("nanoseconds", YangValue::uint(u64::from(self.base_time.1))),
                ]),
            ),
            YangValue::entry("admin-control-list", YangValue::Array(control_list)),
            YangValue::entry("config-change", YangValue::Bool(true)),
        ]);

        interface_payload(
            &self.interface,
            "ieee802-dot1q-sched:gate-parameter-table",
            table,
        )
    }
}

/// Credit-based shaper slope for one traffic class of one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbsConfig {
    pub interface: String,
    /// Traffic class 0..7.
    pub traffic_class: u8,
    /// Idle slope in bits per second.
    pub idle_slope: u64,
}

impl CbsConfig {
    fn validate(&self) -> Result<()> {
        if self.traffic_class > 7 {
            return Err(Error::Validation {
                path: "traffic-class".into(),
                reason: format!("{} outside 0..=7", self.traffic_class),
            });
        }
        Ok(())
    }

    fn to_value(&self) -> YangValue {
        let shaper = YangValue::map(vec![YangValue::entry(
            "shaper",
            YangValue::Array(vec![YangValue::map(vec![
                YangValue::entry(
                    "traffic-class",
                    YangValue::uint(u64::from(self.traffic_class)),
                ),
                YangValue::entry("idle-slope", YangValue::uint(self.idle_slope)),
                YangValue::entry("credit-based", YangValue::Bool(true)),
            ])]),
        )]);

        interface_payload(&self.interface, "mchp-velocitysp-port:eth-qos", shaper)
    }
}

/// Wrap a per-port subtree in the interface list entry that addresses it.
fn interface_payload(interface: &str, subtree: &str, value: YangValue) -> YangValue {
    YangValue::map(vec![YangValue::entry(
        "interface",
        YangValue::Array(vec![YangValue::map(vec![
            YangValue::entry("name", interface.into()),
            YangValue::entry(subtree, value),
        ])]),
    )])
}

impl Device {
    /// Configure a PTP instance (IEEE 1588 default data set).
    pub async fn set_ptp_instance(&self, instance: &PtpInstance) -> Result<()> {
        self.yang_set("/ieee1588-ptp:ptp/instances", instance.to_value())
            .await
    }

    /// Install a Qbv gate schedule on a port.
    pub async fn set_tas_schedule(&self, schedule: &TasSchedule) -> Result<()> {
        schedule.validate()?;
        self.yang_set("/ietf-interfaces:interfaces", schedule.to_value())
            .await
    }

    /// Set the credit-based shaper idle slope for one traffic class.
    pub async fn set_cbs_idle_slope(&self, config: &CbsConfig) -> Result<()> {
        config.validate()?;
        self.yang_set("/ietf-interfaces:interfaces", config.to_value())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tas_payload_shape() {
        let schedule = TasSchedule::new("2", 1_000_000)
            .entry(0b0000_0001, 600_000)
            .entry(0b1111_1110, 400_000);
        schedule.validate().unwrap();

        let value = schedule.to_value();
        let port = &value.get("interface").unwrap().as_array().unwrap()[0];
        assert_eq!(port.get("name").unwrap().as_text(), Some("2"));

        let table = port
            .get("ieee802-dot1q-sched:gate-parameter-table")
            .unwrap();
        let cycle = table.get("admin-cycle-time").unwrap();
        assert_eq!(cycle.get("numerator").unwrap().as_int(), Some(1_000_000));
        assert_eq!(
            cycle.get("denominator").unwrap().as_int(),
            Some(i128::from(NS_PER_SEC))
        );

        let entries = table.get("admin-control-list").unwrap().as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].get("index").unwrap().as_int(), Some(0));
        assert_eq!(entries[0].get("gate-states-value").unwrap().as_int(), Some(1));
        assert_eq!(entries[1].get("gate-states-value").unwrap().as_int(), Some(0xFE));
        assert_eq!(
            entries[1].get("time-interval-value").unwrap().as_int(),
            Some(400_000)
        );
    }

    #[test]
    fn tas_rejects_overlong_entries() {
        let schedule = TasSchedule::new("1", 1000).entry(0xFF, 600).entry(0x01, 600);
        assert!(matches!(
            schedule.validate(),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn tas_rejects_empty_schedule() {
        assert!(TasSchedule::new("1", 1000).validate().is_err());
    }

    #[test]
    fn cbs_payload_shape_and_range() {
        let config = CbsConfig {
            interface: "3".into(),
            traffic_class: 6,
            idle_slope: 20_000_000,
        };
        config.validate().unwrap();

        let value = config.to_value();
        let port = &value.get("interface").unwrap().as_array().unwrap()[0];
        let shaper = &port
            .get("mchp-velocitysp-port:eth-qos")
            .unwrap()
            .get("shaper")
            .unwrap()
            .as_array()
            .unwrap()[0];
        assert_eq!(shaper.get("traffic-class").unwrap().as_int(), Some(6));
        assert_eq!(shaper.get("idle-slope").unwrap().as_int(), Some(20_000_000));

        let bad = CbsConfig {
            traffic_class: 8,
            ..config
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn ptp_payload_shape() {
        let instance = PtpInstance {
            instance_index: 1,
            domain_number: 4,
            ..PtpInstance::default()
        };
        let value = instance.to_value();
        let inst = &value.get("instance").unwrap().as_array().unwrap()[0];
        assert_eq!(inst.get("instance-index").unwrap().as_int(), Some(1));
        let ds = inst.get("default-ds").unwrap();
        assert_eq!(ds.get("priority1").unwrap().as_int(), Some(128));
        assert_eq!(ds.get("domain-number").unwrap().as_int(), Some(4));
        assert_eq!(ds.get("slave-only").unwrap(), &YangValue::Bool(false));
    }
}
