use std::collections::HashMap;

use crate::error::{HomologaError, Result};
use crate::profiles::{ColumnSpec, PlatformProfile, SimProfile};
use crate::records::{PlatformField, SimField};

/// Resolved canonical-field to zero-based column index mapping for one
/// concrete header row. Built once per source per run, never mutated.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    indices: HashMap<PlatformField, usize>,
}

impl ColumnMap {
    pub fn index(&self, field: PlatformField) -> Option<usize> {
        self.indices.get(&field).copied()
    }
}

/// Resolves a platform profile against a header row by exact label match.
///
/// All-or-nothing: the first profile label absent from the header fails the
/// entire profile. A partially matched profile risks silently mis-mapping
/// unrelated columns, so no partial output ever escapes.
pub fn resolve_platform_columns(
    source_id: &str,
    header: &[String],
    profile: &PlatformProfile,
) -> Result<ColumnMap> {
    let mut indices = HashMap::new();
    for field in PlatformField::ALL {
        if let ColumnSpec::Column(label) = profile.spec(field) {
            match header.iter().position(|h| h == label) {
                Some(idx) => {
                    indices.insert(field, idx);
                }
                None => {
                    return Err(HomologaError::Resolution {
                        source_id: source_id.to_string(),
                        column: label.to_string(),
                    })
                }
            }
        }
    }
    Ok(ColumnMap { indices })
}

/// Resolved indices for the five canonical SIM fields. `None` entries mean
/// the field yields an empty string for every row of this source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimColumnMap {
    pub iccid: Option<usize>,
    pub phone: Option<usize>,
    pub sim_status: Option<usize>,
    pub session_status: Option<usize>,
    pub consumption_mb: Option<usize>,
}

impl SimColumnMap {
    /// Complete field-by-field assignment, as supplied by the interactive
    /// fallback when no profile matches.
    pub fn manual(
        iccid: usize,
        phone: usize,
        sim_status: usize,
        session_status: usize,
        consumption_mb: usize,
    ) -> Self {
        Self {
            iccid: Some(iccid),
            phone: Some(phone),
            sim_status: Some(sim_status),
            session_status: Some(session_status),
            consumption_mb: Some(consumption_mb),
        }
    }

    pub fn index(&self, field: SimField) -> Option<usize> {
        match field {
            SimField::Iccid => self.iccid,
            SimField::Phone => self.phone,
            SimField::SimStatus => self.sim_status,
            SimField::SessionStatus => self.session_status,
            SimField::ConsumptionMb => self.consumption_mb,
        }
    }
}

/// Resolves a SIM profile against a header row, all-or-nothing as above.
pub fn resolve_sim_columns(
    source_id: &str,
    header: &[String],
    profile: &SimProfile,
) -> Result<SimColumnMap> {
    let mut indices = [None; 5];
    for (slot, field) in indices.iter_mut().zip(SimField::ALL) {
        let label = profile.label(field);
        match header.iter().position(|h| h == label) {
            Some(idx) => *slot = Some(idx),
            None => {
                return Err(HomologaError::Resolution {
                    source_id: source_id.to_string(),
                    column: label.to_string(),
                })
            }
        }
    }
    let [iccid, phone, sim_status, session_status, consumption_mb] = indices;
    Ok(SimColumnMap {
        iccid,
        phone,
        sim_status,
        session_status,
        consumption_mb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{platform_profile, sim_profile};

    fn header(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sim_resolution_maps_all_five_fields() {
        let profile = sim_profile("MOVISTAR").unwrap();
        let header = header(&[
            "ICC",
            "MSISDN",
            "Estado",
            "Estado GPRS",
            "Consumo Datos Mensual",
        ]);
        let map = resolve_sim_columns("MOVISTAR", &header, profile).unwrap();
        assert_eq!(map.iccid, Some(0));
        assert_eq!(map.consumption_mb, Some(4));
    }

    #[test]
    fn resolution_is_all_or_nothing() {
        // "Estado GPRS" missing: none of the other four fields resolve
        let profile = sim_profile("MOVISTAR").unwrap();
        let header = header(&["ICC", "MSISDN", "Estado", "Consumo Datos Mensual"]);
        let err = resolve_sim_columns("MOVISTAR", &header, profile).unwrap_err();
        match err {
            HomologaError::Resolution { source_id, column } => {
                assert_eq!(source_id, "MOVISTAR");
                assert_eq!(column, "Estado GPRS");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn platform_resolution_skips_unmapped_fields() {
        let profile = platform_profile("ADAS").unwrap();
        let header = header(&[
            "equipo",
            "Subordinar",
            "Modelo",
            "IMEI",
            "Iccid",
            "Activation Date",
            "Número de tarjeta SIM",
        ]);
        let map = resolve_platform_columns("ADAS", &header, profile).unwrap();
        assert_eq!(map.index(PlatformField::ClientAccount), Some(1));
        assert_eq!(map.index(PlatformField::Vehicle), None);
        assert_eq!(map.index(PlatformField::Origin), None);
    }

    #[test]
    fn platform_resolution_fails_on_missing_label() {
        let profile = platform_profile("WIALON").unwrap();
        let header = header(&["Nombre", "Cuenta", "IMEI"]);
        assert!(resolve_platform_columns("WIALON", &header, profile).is_err());
    }

    #[test]
    fn manual_mapping_is_complete() {
        let map = SimColumnMap::manual(3, 1, 0, 2, 4);
        assert_eq!(map.index(SimField::Iccid), Some(3));
        assert_eq!(map.index(SimField::ConsumptionMb), Some(4));
    }
}
