use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::records::{PlatformField, SimField};

/// How one canonical field is sourced for a given profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSpec {
    /// Read from the source column carrying this header label.
    Column(&'static str),
    /// Fixed constant for every row of this source.
    Fixed(&'static str),
    /// Derived from the date token embedded in the upload's filename.
    FileDate,
    /// Never populated for this source.
    Unmapped,
}

/// Static column-mapping template for one named platform source.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    origin: &'static str,
    columns: HashMap<PlatformField, ColumnSpec>,
}

impl PlatformProfile {
    fn new(origin: &'static str, columns: &[(PlatformField, &'static str)]) -> Self {
        Self {
            origin,
            columns: columns
                .iter()
                .map(|&(field, label)| (field, ColumnSpec::Column(label)))
                .collect(),
        }
    }

    /// Fixed label written to every record's `Origin` field.
    pub fn origin(&self) -> &'static str {
        self.origin
    }

    pub fn spec(&self, field: PlatformField) -> ColumnSpec {
        match field {
            PlatformField::Origin => ColumnSpec::Fixed(self.origin),
            PlatformField::SourceFileDate => ColumnSpec::FileDate,
            other => self.columns.get(&other).copied().unwrap_or(ColumnSpec::Unmapped),
        }
    }

    /// Completeness metric: how many canonical fields this profile actually
    /// maps. Counts source columns and the fixed origin label; the
    /// filename-derived date does not count as a mapped field.
    pub fn mapped_field_count(&self) -> usize {
        PlatformField::ALL
            .iter()
            .filter(|&&f| matches!(self.spec(f), ColumnSpec::Column(_) | ColumnSpec::Fixed(_)))
            .count()
    }
}

/// Static column-mapping template for one named SIM source. SIM profiles
/// always map all five fields to source columns.
#[derive(Debug, Clone, Copy)]
pub struct SimProfile {
    pub iccid: &'static str,
    pub phone: &'static str,
    pub sim_status: &'static str,
    pub session_status: &'static str,
    pub consumption_mb: &'static str,
}

impl SimProfile {
    pub fn label(&self, field: SimField) -> &'static str {
        match field {
            SimField::Iccid => self.iccid,
            SimField::Phone => self.phone,
            SimField::SimStatus => self.sim_status,
            SimField::SessionStatus => self.session_status,
            SimField::ConsumptionMb => self.consumption_mb,
        }
    }
}

/// Registry of known platform sources, keyed by sheet name.
/// Adding a source is a data addition here, not a code change.
pub static PLATFORM_PROFILES: Lazy<HashMap<&'static str, PlatformProfile>> = Lazy::new(|| {
    use PlatformField::*;
    let mut profiles = HashMap::new();
    profiles.insert(
        "WIALON",
        PlatformProfile::new(
            "WIALON",
            &[
                (Name, "Nombre"),
                (ClientAccount, "Cuenta"),
                (DeviceType, "Tipo de dispositivo"),
                (Imei, "IMEI"),
                (Iccid, "Iccid"),
                (ActivationDate, "Creada"),
                (DeactivationDate, "Desactivación"),
                (LastMessageTime, "Hora de último mensaje"),
                (LastReport, "Ultimo Reporte"),
                (Group, "Grupos"),
                (Phone, "Teléfono"),
            ],
        ),
    );
    profiles.insert(
        "ADAS",
        PlatformProfile::new(
            "ADAS",
            &[
                (Name, "equipo"),
                (ClientAccount, "Subordinar"),
                (DeviceType, "Modelo"),
                (Imei, "IMEI"),
                (Iccid, "Iccid"),
                (ActivationDate, "Activation Date"),
                (Phone, "Número de tarjeta SIM"),
            ],
        ),
    );
    profiles.insert(
        "COMBUSTIBLE",
        PlatformProfile::new(
            "COMBUSTIBLE",
            &[
                (Name, "Vehículo"),
                (ClientAccount, "Cuenta"),
                (DeviceType, "Tanques"),
                (LastReport, "Último reporte"),
                (Vehicle, "Vehículo"),
                (Services, "Servicios"),
                (Group, "Grupos"),
                (Phone, "Línea"),
            ],
        ),
    );
    profiles
});

/// Registry of known SIM sources, keyed by sheet name or file-name stem.
pub static SIM_PROFILES: Lazy<HashMap<&'static str, SimProfile>> = Lazy::new(|| {
    let mut profiles = HashMap::new();
    profiles.insert(
        "SIMPATIC",
        SimProfile {
            iccid: "iccid",
            phone: "msisdn",
            sim_status: "status",
            session_status: "status",
            consumption_mb: "consumo en Mb",
        },
    );
    profiles.insert(
        "TELCEL ALEJANDRO",
        SimProfile {
            iccid: "ICCID",
            phone: "MSISDN",
            sim_status: "ESTADO SIM",
            session_status: "SESIÓN",
            consumption_mb: "LÍMITE DE USO DE DATOS",
        },
    );
    // "-1" and "-2" are literal sheet names in the carrier's export
    let ciclo = SimProfile {
        iccid: "ICCID",
        phone: "MSISDN",
        sim_status: "Estado de SIM",
        session_status: "En sesión",
        consumption_mb: "Uso de ciclo hasta la fecha (MB)",
    };
    profiles.insert("-1", ciclo);
    profiles.insert("-2", ciclo);
    profiles.insert(
        "TELCEL",
        SimProfile {
            iccid: "Cuenta Padre",
            phone: "Línea",
            sim_status: "Estatus línea",
            session_status: "Estatus línea",
            consumption_mb: "Estatus línea",
        },
    );
    profiles.insert(
        "MOVISTAR",
        SimProfile {
            iccid: "ICC",
            phone: "MSISDN",
            sim_status: "Estado",
            session_status: "Estado GPRS",
            consumption_mb: "Consumo Datos Mensual",
        },
    );
    profiles.insert(
        "NANTI",
        SimProfile {
            iccid: "ICCID",
            phone: "MSISDN",
            sim_status: "Estado",
            session_status: "Estado",
            consumption_mb: "Estado",
        },
    );
    profiles.insert(
        "LEGACY",
        SimProfile {
            iccid: "ICCID",
            phone: "TELEFONO",
            sim_status: "Estatus",
            session_status: "Estatus",
            consumption_mb: "BSP Nacional",
        },
    );
    profiles
});

/// Exact-identifier lookup; unknown sources get `None` and the caller must
/// fall back to a manual mapping.
pub fn platform_profile(source_id: &str) -> Option<&'static PlatformProfile> {
    PLATFORM_PROFILES.get(source_id)
}

pub fn sim_profile(source_id: &str) -> Option<&'static SimProfile> {
    SIM_PROFILES.get(source_id)
}

/// All registered platform source identifiers, sorted for stable reporting.
pub fn platform_sources() -> Vec<&'static str> {
    let mut sources: Vec<&'static str> = PLATFORM_PROFILES.keys().copied().collect();
    sources.sort_unstable();
    sources
}
