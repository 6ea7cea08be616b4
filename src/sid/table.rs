//! Embedded SID assignments.
//!
//! Rows are grouped by module and kept in SID order within each group.

use super::{DataType, SidEntry, SidKind};

const fn container(sid: u32, path: &'static str) -> SidEntry {
    SidEntry {
        sid,
        path,
        kind: SidKind::Container,
        datatype: None,
        key: None,
    }
}

const fn list(sid: u32, path: &'static str, key: &'static str) -> SidEntry {
    SidEntry {
        sid,
        path,
        kind: SidKind::List,
        datatype: None,
        key: Some(key),
    }
}

const fn leaf(sid: u32, path: &'static str, datatype: DataType) -> SidEntry {
    SidEntry {
        sid,
        path,
        kind: SidKind::Leaf,
        datatype: Some(datatype),
        key: None,
    }
}

const fn rpc(sid: u32, path: &'static str) -> SidEntry {
    SidEntry {
        sid,
        path,
        kind: SidKind::Rpc,
        datatype: None,
        key: None,
    }
}

const fn action(sid: u32, path: &'static str) -> SidEntry {
    SidEntry {
        sid,
        path,
        kind: SidKind::Action,
        datatype: None,
        key: None,
    }
}

pub(super) static ENTRIES: &[SidEntry] = &[
    // ietf-interfaces (1000-1999)
    container(1000, "/ietf-interfaces:interfaces"),
    list(1001, "/ietf-interfaces:interfaces/interface", "name"),
    leaf(1002, "/ietf-interfaces:interfaces/interface/name", DataType::String),
    leaf(1003, "/ietf-interfaces:interfaces/interface/description", DataType::String),
    leaf(1004, "/ietf-interfaces:interfaces/interface/type", DataType::IdentityRef),
    leaf(1005, "/ietf-interfaces:interfaces/interface/enabled", DataType::Boolean),
    leaf(1006, "/ietf-interfaces:interfaces/interface/oper-status", DataType::Enumeration),
    leaf(1007, "/ietf-interfaces:interfaces/interface/if-index", DataType::Int32),
    leaf(1008, "/ietf-interfaces:interfaces/interface/phys-address", DataType::String),
    leaf(1009, "/ietf-interfaces:interfaces/interface/speed", DataType::Uint64),
    container(1010, "/ietf-interfaces:interfaces/interface/statistics"),
    leaf(1011, "/ietf-interfaces:interfaces/interface/statistics/in-octets", DataType::Uint64),
    leaf(1012, "/ietf-interfaces:interfaces/interface/statistics/out-octets", DataType::Uint64),
    leaf(1013, "/ietf-interfaces:interfaces/interface/statistics/in-errors", DataType::Uint32),
    leaf(1014, "/ietf-interfaces:interfaces/interface/statistics/out-errors", DataType::Uint32),
    leaf(1015, "/ietf-interfaces:interfaces/interface/statistics/in-discards", DataType::Uint32),
    leaf(1016, "/ietf-interfaces:interfaces/interface/statistics/out-discards", DataType::Uint32),
    // ieee802-dot1q-bridge (2000-2499)
    container(2000, "/ieee802-dot1q-bridge:bridges"),
    list(2001, "/ieee802-dot1q-bridge:bridges/bridge", "name"),
    leaf(2002, "/ieee802-dot1q-bridge:bridges/bridge/name", DataType::String),
    leaf(2003, "/ieee802-dot1q-bridge:bridges/bridge/address", DataType::String),
    leaf(2004, "/ieee802-dot1q-bridge:bridges/bridge/bridge-type", DataType::IdentityRef),
    list(2005, "/ieee802-dot1q-bridge:bridges/bridge/component", "name"),
    leaf(2006, "/ieee802-dot1q-bridge:bridges/bridge/component/name", DataType::String),
    container(2010, "/ieee802-dot1q-bridge:bridges/bridge/component/filtering-database"),
    list(
        2011,
        "/ieee802-dot1q-bridge:bridges/bridge/component/filtering-database/vlan-registration-entry",
        "vids",
    ),
    leaf(
        2012,
        "/ieee802-dot1q-bridge:bridges/bridge/component/filtering-database/vlan-registration-entry/vids",
        DataType::String,
    ),
    container(2020, "/ieee802-dot1q-bridge:bridges/bridge/component/bridge-vlan"),
    list(2021, "/ieee802-dot1q-bridge:bridges/bridge/component/bridge-vlan/vlan", "vid"),
    leaf(
        2022,
        "/ieee802-dot1q-bridge:bridges/bridge/component/bridge-vlan/vlan/vid",
        DataType::Uint16,
    ),
    leaf(
        2023,
        "/ieee802-dot1q-bridge:bridges/bridge/component/bridge-vlan/vlan/name",
        DataType::String,
    ),
    // ieee802-dot1q-sched Qbv augmentation of the interface list (2500-2599)
    container(
        2500,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table",
    ),
    leaf(
        2501,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/gate-enabled",
        DataType::Boolean,
    ),
    leaf(
        2502,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-gate-states",
        DataType::Uint8,
    ),
    list(
        2503,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-control-list",
        "index",
    ),
    leaf(
        2504,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-control-list/index",
        DataType::Uint32,
    ),
    leaf(
        2505,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-control-list/operation-name",
        DataType::IdentityRef,
    ),
    leaf(
        2506,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-control-list/gate-states-value",
        DataType::Uint8,
    ),
    leaf(
        2507,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-control-list/time-interval-value",
        DataType::Uint32,
    ),
    container(
        2508,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-cycle-time",
    ),
    leaf(
        2509,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-cycle-time/numerator",
        DataType::Uint32,
    ),
    leaf(
        2510,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-cycle-time/denominator",
        DataType::Uint32,
    ),
    container(
        2511,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-base-time",
    ),
    leaf(
        2512,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-base-time/seconds",
        DataType::Uint64,
    ),
    leaf(
        2513,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/admin-base-time/nanoseconds",
        DataType::Uint32,
    ),
    leaf(
        2514,
        "/ietf-interfaces:interfaces/interface/ieee802-dot1q-sched:gate-parameter-table/config-change",
        DataType::Boolean,
    ),
    // ieee1588-ptp (3000-3999)
    container(3000, "/ieee1588-ptp:ptp"),
    container(3001, "/ieee1588-ptp:ptp/instances"),
    list(3002, "/ieee1588-ptp:ptp/instances/instance", "instance-index"),
    leaf(3003, "/ieee1588-ptp:ptp/instances/instance/instance-index", DataType::Uint32),
    container(3004, "/ieee1588-ptp:ptp/instances/instance/default-ds"),
    leaf(
        3005,
        "/ieee1588-ptp:ptp/instances/instance/default-ds/clock-identity",
        DataType::Binary,
    ),
    leaf(3006, "/ieee1588-ptp:ptp/instances/instance/default-ds/priority1", DataType::Uint8),
    leaf(3007, "/ieee1588-ptp:ptp/instances/instance/default-ds/priority2", DataType::Uint8),
    leaf(
        3008,
        "/ieee1588-ptp:ptp/instances/instance/default-ds/domain-number",
        DataType::Uint8,
    ),
    leaf(
        3009,
        "/ieee1588-ptp:ptp/instances/instance/default-ds/slave-only",
        DataType::Boolean,
    ),
    container(3010, "/ieee1588-ptp:ptp/instances/instance/current-ds"),
    leaf(
        3011,
        "/ieee1588-ptp:ptp/instances/instance/current-ds/steps-removed",
        DataType::Uint16,
    ),
    leaf(
        3012,
        "/ieee1588-ptp:ptp/instances/instance/current-ds/offset-from-master",
        DataType::Int64,
    ),
    container(3020, "/ieee1588-ptp:ptp/instances/instance/ports"),
    list(3021, "/ieee1588-ptp:ptp/instances/instance/ports/port", "port-index"),
    leaf(
        3022,
        "/ieee1588-ptp:ptp/instances/instance/ports/port/port-index",
        DataType::Uint16,
    ),
    leaf(
        3023,
        "/ieee1588-ptp:ptp/instances/instance/ports/port/port-ds/port-state",
        DataType::Enumeration,
    ),
    // mchp-velocitysp vendor extensions (4000-4299)
    rpc(4000, "/mchp-velocitysp-system:save-config"),
    rpc(4001, "/mchp-velocitysp-system:reset"),
    container(4002, "/mchp-velocitysp-firmware:firmware"),
    action(4003, "/mchp-velocitysp-firmware:firmware/upgrade"),
    leaf(4004, "/mchp-velocitysp-firmware:firmware/version", DataType::String),
    leaf(4005, "/mchp-velocitysp-firmware:firmware/build-date", DataType::String),
    container(4100, "/ietf-interfaces:interfaces/interface/mchp-velocitysp-port:eth-qos"),
    list(
        4101,
        "/ietf-interfaces:interfaces/interface/mchp-velocitysp-port:eth-qos/shaper",
        "traffic-class",
    ),
    leaf(
        4102,
        "/ietf-interfaces:interfaces/interface/mchp-velocitysp-port:eth-qos/shaper/traffic-class",
        DataType::Uint8,
    ),
    leaf(
        4103,
        "/ietf-interfaces:interfaces/interface/mchp-velocitysp-port:eth-qos/shaper/idle-slope",
        DataType::Uint64,
    ),
    leaf(
        4104,
        "/ietf-interfaces:interfaces/interface/mchp-velocitysp-port:eth-qos/shaper/credit-based",
        DataType::Boolean,
    ),
    // ietf-constrained-yang-library (29300-29399)
    container(29300, "/ietf-constrained-yang-library:yang-library"),
    list(29301, "/ietf-constrained-yang-library:yang-library/module-set", "name"),
    leaf(
        29302,
        "/ietf-constrained-yang-library:yang-library/module-set/name",
        DataType::String,
    ),
    leaf(29303, "/ietf-constrained-yang-library:yang-library/content-id", DataType::String),
    leaf(29304, "/ietf-constrained-yang-library:yang-library/checksum", DataType::String),
];
