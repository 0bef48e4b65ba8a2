//! Network snapshot model
//!
//! A read-only view of one network variant: substations, voltage levels and
//! the equipment connected to them. Snapshots are built from [`NetworkData`]
//! documents and validated once; evaluation never fails on dangling ids.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::data::error::FilterError;

/// Equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentType {
    Substation,
    VoltageLevel,
    Line,
    TwoWindingsTransformer,
    ThreeWindingsTransformer,
    Generator,
    Load,
    Battery,
    ShuntCompensator,
    StaticVarCompensator,
    DanglingLine,
    HvdcLine,
    BusbarSection,
}

impl EquipmentType {
    pub const ALL: [EquipmentType; 13] = [
        EquipmentType::Substation,
        EquipmentType::VoltageLevel,
        EquipmentType::Line,
        EquipmentType::TwoWindingsTransformer,
        EquipmentType::ThreeWindingsTransformer,
        EquipmentType::Generator,
        EquipmentType::Load,
        EquipmentType::Battery,
        EquipmentType::ShuntCompensator,
        EquipmentType::StaticVarCompensator,
        EquipmentType::DanglingLine,
        EquipmentType::HvdcLine,
        EquipmentType::BusbarSection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentType::Substation => "SUBSTATION",
            EquipmentType::VoltageLevel => "VOLTAGE_LEVEL",
            EquipmentType::Line => "LINE",
            EquipmentType::TwoWindingsTransformer => "TWO_WINDINGS_TRANSFORMER",
            EquipmentType::ThreeWindingsTransformer => "THREE_WINDINGS_TRANSFORMER",
            EquipmentType::Generator => "GENERATOR",
            EquipmentType::Load => "LOAD",
            EquipmentType::Battery => "BATTERY",
            EquipmentType::ShuntCompensator => "SHUNT_COMPENSATOR",
            EquipmentType::StaticVarCompensator => "STATIC_VAR_COMPENSATOR",
            EquipmentType::DanglingLine => "DANGLING_LINE",
            EquipmentType::HvdcLine => "HVDC_LINE",
            EquipmentType::BusbarSection => "BUSBAR_SECTION",
        }
    }

    /// Number of voltage levels an equipment of this category connects to
    pub fn side_count(&self) -> usize {
        match self {
            EquipmentType::Substation => 0,
            EquipmentType::Line | EquipmentType::TwoWindingsTransformer | EquipmentType::HvdcLine => 2,
            EquipmentType::ThreeWindingsTransformer => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EquipmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        EquipmentType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("Unknown equipment type '{}'", s))
    }
}

/// Invalid network document
#[derive(Error, Debug, PartialEq)]
pub enum NetworkError {
    #[error("Duplicate identifier '{0}'")]
    DuplicateId(String),

    #[error("{kind} '{id}' references unknown {target} '{reference}'")]
    DanglingReference {
        kind: &'static str,
        id: String,
        target: &'static str,
        reference: String,
    },

    #[error("{equipment_type} '{id}' must connect {expected} voltage level(s), got {actual}")]
    SideCount {
        equipment_type: EquipmentType,
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("{0} cannot be listed as connected equipment")]
    NotEquipment(EquipmentType),

    #[error("Voltage level '{id}' has an invalid nominal voltage {nominal_v}")]
    InvalidNominalVoltage { id: String, nominal_v: f64 },
}

impl From<NetworkError> for FilterError {
    fn from(e: NetworkError) -> Self {
        FilterError::EvaluateFilterFailed(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substation {
    pub id: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoltageLevel {
    pub id: String,
    #[serde(default)]
    pub substation_id: Option<String>,
    pub nominal_v: f64,
}

/// Equipment connected to one or more voltage levels, in side order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: String,
    pub equipment_type: EquipmentType,
    pub voltage_level_ids: Vec<String>,
}

/// Raw network document as served by the network store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkData {
    #[serde(default)]
    pub substations: Vec<Substation>,
    #[serde(default)]
    pub voltage_levels: Vec<VoltageLevel>,
    #[serde(default)]
    pub equipments: Vec<Equipment>,
}

/// One side of a candidate: its voltage level and that level's substation
#[derive(Debug, Clone, Copy)]
pub struct Side<'a> {
    pub voltage_level: &'a VoltageLevel,
    pub substation: Option<&'a Substation>,
}

/// Anything a rule can be evaluated against
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub id: &'a str,
    pub equipment_type: EquipmentType,
    /// Substation of a SUBSTATION candidate
    pub substation: Option<&'a Substation>,
    pub sides: Vec<Side<'a>>,
}

/// Validated network variant
#[derive(Debug, Clone)]
pub struct NetworkSnapshot {
    network_id: Uuid,
    variant_id: String,
    substations: Vec<Substation>,
    voltage_levels: Vec<VoltageLevel>,
    equipments: Vec<Equipment>,
    substation_index: FxHashMap<String, usize>,
    voltage_level_index: FxHashMap<String, usize>,
}

impl NetworkSnapshot {
    /// Validate a network document and pin it to a network id and variant
    pub fn from_data(
        network_id: Uuid,
        variant_id: impl Into<String>,
        data: NetworkData,
    ) -> Result<Self, NetworkError> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let ids = data
            .substations
            .iter()
            .map(|s| s.id.as_str())
            .chain(data.voltage_levels.iter().map(|v| v.id.as_str()))
            .chain(data.equipments.iter().map(|e| e.id.as_str()));
        for id in ids {
            if !seen.insert(id) {
                return Err(NetworkError::DuplicateId(id.to_string()));
            }
        }

        let substation_index: FxHashMap<String, usize> = data
            .substations
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        for vl in &data.voltage_levels {
            if !vl.nominal_v.is_finite() || vl.nominal_v < 0.0 {
                return Err(NetworkError::InvalidNominalVoltage {
                    id: vl.id.clone(),
                    nominal_v: vl.nominal_v,
                });
            }
            if let Some(substation_id) = &vl.substation_id
                && !substation_index.contains_key(substation_id)
            {
                return Err(NetworkError::DanglingReference {
                    kind: "Voltage level",
                    id: vl.id.clone(),
                    target: "substation",
                    reference: substation_id.clone(),
                });
            }
        }

        let voltage_level_index: FxHashMap<String, usize> = data
            .voltage_levels
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id.clone(), i))
            .collect();

        for equipment in &data.equipments {
            let expected = equipment.equipment_type.side_count();
            if matches!(
                equipment.equipment_type,
                EquipmentType::Substation | EquipmentType::VoltageLevel
            ) {
                return Err(NetworkError::NotEquipment(equipment.equipment_type));
            }
            if equipment.voltage_level_ids.len() != expected {
                return Err(NetworkError::SideCount {
                    equipment_type: equipment.equipment_type,
                    id: equipment.id.clone(),
                    expected,
                    actual: equipment.voltage_level_ids.len(),
                });
            }
            if let Some(missing) = equipment
                .voltage_level_ids
                .iter()
                .find(|id| !voltage_level_index.contains_key(*id))
            {
                return Err(NetworkError::DanglingReference {
                    kind: "Equipment",
                    id: equipment.id.clone(),
                    target: "voltage level",
                    reference: missing.clone(),
                });
            }
        }

        Ok(Self {
            network_id,
            variant_id: variant_id.into(),
            substations: data.substations,
            voltage_levels: data.voltage_levels,
            equipments: data.equipments,
            substation_index,
            voltage_level_index,
        })
    }

    /// Start building a snapshot in code
    pub fn builder(network_id: Uuid, variant_id: impl Into<String>) -> NetworkBuilder {
        NetworkBuilder {
            network_id,
            variant_id: variant_id.into(),
            data: NetworkData::default(),
        }
    }

    pub fn network_id(&self) -> Uuid {
        self.network_id
    }

    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    pub fn substation(&self, id: &str) -> Option<&Substation> {
        self.substation_index.get(id).map(|&i| &self.substations[i])
    }

    pub fn voltage_level(&self, id: &str) -> Option<&VoltageLevel> {
        self.voltage_level_index.get(id).map(|&i| &self.voltage_levels[i])
    }

    /// Every element of `equipment_type`, in document order
    pub fn candidates(&self, equipment_type: EquipmentType) -> Vec<Candidate<'_>> {
        match equipment_type {
            EquipmentType::Substation => self
                .substations
                .iter()
                .map(|s| Candidate {
                    id: &s.id,
                    equipment_type,
                    substation: Some(s),
                    sides: Vec::new(),
                })
                .collect(),
            EquipmentType::VoltageLevel => self
                .voltage_levels
                .iter()
                .map(|vl| Candidate {
                    id: &vl.id,
                    equipment_type,
                    substation: None,
                    sides: vec![self.side(vl)],
                })
                .collect(),
            _ => self
                .equipments
                .iter()
                .filter(|e| e.equipment_type == equipment_type)
                .map(|e| Candidate {
                    id: &e.id,
                    equipment_type,
                    substation: None,
                    sides: e
                        .voltage_level_ids
                        .iter()
                        .filter_map(|id| self.voltage_level(id))
                        .map(|vl| self.side(vl))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Ids of `equipment_type` present in this snapshot
    pub fn ids_of(&self, equipment_type: EquipmentType) -> FxHashSet<&str> {
        self.candidates(equipment_type)
            .into_iter()
            .map(|c| c.id)
            .collect()
    }

    fn side<'a>(&'a self, vl: &'a VoltageLevel) -> Side<'a> {
        Side {
            voltage_level: vl,
            substation: vl.substation_id.as_deref().and_then(|id| self.substation(id)),
        }
    }
}

/// Programmatic snapshot construction
#[derive(Debug)]
pub struct NetworkBuilder {
    network_id: Uuid,
    variant_id: String,
    data: NetworkData,
}

impl NetworkBuilder {
    pub fn substation(mut self, id: &str, country: Option<&str>, properties: &[(&str, &str)]) -> Self {
        self.data.substations.push(Substation {
            id: id.to_string(),
            country: country.map(str::to_string),
            properties: properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self
    }

    pub fn voltage_level(mut self, id: &str, substation_id: &str, nominal_v: f64) -> Self {
        self.data.voltage_levels.push(VoltageLevel {
            id: id.to_string(),
            substation_id: Some(substation_id.to_string()),
            nominal_v,
        });
        self
    }

    pub fn equipment(mut self, id: &str, equipment_type: EquipmentType, voltage_level_ids: &[&str]) -> Self {
        self.data.equipments.push(Equipment {
            id: id.to_string(),
            equipment_type,
            voltage_level_ids: voltage_level_ids.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn build(self) -> Result<NetworkSnapshot, NetworkError> {
        NetworkSnapshot::from_data(self.network_id, self.variant_id, self.data)
    }
}
