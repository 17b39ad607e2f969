use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The fifteen canonical platform fields, in persisted column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformField {
    Name,
    ClientAccount,
    DeviceType,
    Imei,
    Iccid,
    ActivationDate,
    DeactivationDate,
    LastMessageTime,
    LastReport,
    Vehicle,
    Services,
    Group,
    Phone,
    Origin,
    SourceFileDate,
}

impl PlatformField {
    pub const ALL: [PlatformField; 15] = [
        PlatformField::Name,
        PlatformField::ClientAccount,
        PlatformField::DeviceType,
        PlatformField::Imei,
        PlatformField::Iccid,
        PlatformField::ActivationDate,
        PlatformField::DeactivationDate,
        PlatformField::LastMessageTime,
        PlatformField::LastReport,
        PlatformField::Vehicle,
        PlatformField::Services,
        PlatformField::Group,
        PlatformField::Phone,
        PlatformField::Origin,
        PlatformField::SourceFileDate,
    ];

    /// Persisted column name for this field.
    pub fn column_name(self) -> &'static str {
        match self {
            PlatformField::Name => "Name",
            PlatformField::ClientAccount => "ClientAccount",
            PlatformField::DeviceType => "DeviceType",
            PlatformField::Imei => "IMEI",
            PlatformField::Iccid => "ICCID",
            PlatformField::ActivationDate => "ActivationDate",
            PlatformField::DeactivationDate => "DeactivationDate",
            PlatformField::LastMessageTime => "LastMessageTime",
            PlatformField::LastReport => "LastReport",
            PlatformField::Vehicle => "Vehicle",
            PlatformField::Services => "Services",
            PlatformField::Group => "Group",
            PlatformField::Phone => "Phone",
            PlatformField::Origin => "Origin",
            PlatformField::SourceFileDate => "SourceFileDate",
        }
    }
}

/// The five canonical SIM fields extracted from every SIM source.
/// `Company` is appended at extraction time, not mapped from a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimField {
    Iccid,
    Phone,
    SimStatus,
    SessionStatus,
    ConsumptionMb,
}

impl SimField {
    pub const ALL: [SimField; 5] = [
        SimField::Iccid,
        SimField::Phone,
        SimField::SimStatus,
        SimField::SessionStatus,
        SimField::ConsumptionMb,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            SimField::Iccid => "ICCID",
            SimField::Phone => "Phone",
            SimField::SimStatus => "SimStatus",
            SimField::SessionStatus => "SessionStatus",
            SimField::ConsumptionMb => "ConsumptionMb",
        }
    }
}

/// Canonical platform record: one row per device/account observation.
///
/// All mapped fields are optional; `origin` and `source_file_date` are
/// always set (profile label and filename-derived date). Created once per
/// source row, never mutated, persisted once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRecord {
    pub name: Option<String>,
    pub client_account: Option<String>,
    pub device_type: Option<String>,
    pub imei: Option<String>,
    pub iccid: Option<String>,
    pub activation_date: Option<String>,
    pub deactivation_date: Option<String>,
    pub last_message_time: Option<String>,
    pub last_report: Option<String>,
    pub vehicle: Option<String>,
    pub services: Option<String>,
    pub group: Option<String>,
    pub phone: Option<String>,
    pub origin: String,
    pub source_file_date: String,
}

/// Canonical SIM record: one row per SIM observation. Fields are plain
/// strings, empty when absent; none is required to be non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimRecord {
    pub iccid: String,
    pub phone: String,
    pub sim_status: String,
    pub session_status: String,
    pub consumption_mb: String,
    pub company: String,
}

/// Classification of one platform source row after mapping and validation.
#[derive(Debug, Clone)]
pub enum RowOutcome {
    /// Row passed validation and became a canonical record.
    Accepted(PlatformRecord),
    /// Row failed validation; the raw label-to-value view is kept for the
    /// invalid sink.
    Invalid(BTreeMap<String, String>),
}
