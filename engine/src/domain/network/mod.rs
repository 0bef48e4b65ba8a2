//! Network model consumed by filter evaluation

mod model;

pub use model::{
    Candidate, Equipment, EquipmentType, NetworkBuilder, NetworkData, NetworkError,
    NetworkSnapshot, Side, Substation, VoltageLevel,
};
