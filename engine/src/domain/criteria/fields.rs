//! Category field table
//!
//! Which field variants each equipment category exposes for every global
//! filter facet. Multi-sided categories expose one side-qualified voltage
//! level id field per side.

use crate::domain::network::EquipmentType;

use super::rules::FieldType;

/// Field variants of one category, per facet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryFields {
    pub nominal_voltage: &'static [FieldType],
    pub country: &'static [FieldType],
    pub substation_properties: &'static [FieldType],
    pub voltage_level_id: &'static [FieldType],
}

const TWO_SIDED_NOMINAL: &[FieldType] = &[FieldType::NominalVoltage1, FieldType::NominalVoltage2];
const TWO_SIDED_PROPERTIES: &[FieldType] = &[
    FieldType::SubstationProperties1,
    FieldType::SubstationProperties2,
];
const TWO_SIDED_VOLTAGE_LEVEL: &[FieldType] = &[FieldType::VoltageLevelId1, FieldType::VoltageLevelId2];
const THREE_SIDED_VOLTAGE_LEVEL: &[FieldType] = &[
    FieldType::VoltageLevelId1,
    FieldType::VoltageLevelId2,
    FieldType::VoltageLevelId3,
];

const LINE: CategoryFields = CategoryFields {
    nominal_voltage: TWO_SIDED_NOMINAL,
    country: &[FieldType::Country1, FieldType::Country2],
    substation_properties: TWO_SIDED_PROPERTIES,
    voltage_level_id: TWO_SIDED_VOLTAGE_LEVEL,
};

const TWO_WINDINGS_TRANSFORMER: CategoryFields = CategoryFields {
    nominal_voltage: TWO_SIDED_NOMINAL,
    country: &[FieldType::Country],
    substation_properties: &[FieldType::SubstationProperties],
    voltage_level_id: TWO_SIDED_VOLTAGE_LEVEL,
};

const VOLTAGE_LEVEL: CategoryFields = CategoryFields {
    nominal_voltage: &[FieldType::NominalVoltage],
    country: &[FieldType::Country],
    substation_properties: &[FieldType::SubstationProperties],
    voltage_level_id: &[],
};

const SUBSTATION: CategoryFields = CategoryFields {
    nominal_voltage: &[],
    country: &[],
    substation_properties: &[FieldType::SubstationProperties],
    voltage_level_id: &[],
};

const HVDC_LINE: CategoryFields = CategoryFields {
    nominal_voltage: &[],
    country: &[],
    substation_properties: &[FieldType::SubstationProperties],
    voltage_level_id: TWO_SIDED_VOLTAGE_LEVEL,
};

const THREE_WINDINGS_TRANSFORMER: CategoryFields = CategoryFields {
    nominal_voltage: &[],
    country: &[],
    substation_properties: &[FieldType::SubstationProperties],
    voltage_level_id: THREE_SIDED_VOLTAGE_LEVEL,
};

const OTHER: CategoryFields = CategoryFields {
    nominal_voltage: &[],
    country: &[],
    substation_properties: &[FieldType::SubstationProperties],
    voltage_level_id: &[FieldType::VoltageLevelId],
};

/// Field table entry for a category
pub fn fields_for(equipment_type: EquipmentType) -> &'static CategoryFields {
    match equipment_type {
        EquipmentType::Line => &LINE,
        EquipmentType::TwoWindingsTransformer => &TWO_WINDINGS_TRANSFORMER,
        EquipmentType::HvdcLine => &HVDC_LINE,
        EquipmentType::ThreeWindingsTransformer => &THREE_WINDINGS_TRANSFORMER,
        EquipmentType::VoltageLevel => &VOLTAGE_LEVEL,
        EquipmentType::Substation => &SUBSTATION,
        _ => &OTHER,
    }
}

pub fn nominal_voltage_fields(equipment_type: EquipmentType) -> &'static [FieldType] {
    fields_for(equipment_type).nominal_voltage
}

pub fn country_fields(equipment_type: EquipmentType) -> &'static [FieldType] {
    fields_for(equipment_type).country
}

pub fn substation_property_fields(equipment_type: EquipmentType) -> &'static [FieldType] {
    fields_for(equipment_type).substation_properties
}

pub fn voltage_level_id_fields(equipment_type: EquipmentType) -> &'static [FieldType] {
    fields_for(equipment_type).voltage_level_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_voltage_fields_by_category() {
        assert_eq!(
            nominal_voltage_fields(EquipmentType::Line),
            [FieldType::NominalVoltage1, FieldType::NominalVoltage2]
        );
        assert_eq!(
            nominal_voltage_fields(EquipmentType::TwoWindingsTransformer),
            [FieldType::NominalVoltage1, FieldType::NominalVoltage2]
        );
        assert_eq!(
            nominal_voltage_fields(EquipmentType::VoltageLevel),
            [FieldType::NominalVoltage]
        );
        assert!(nominal_voltage_fields(EquipmentType::Generator).is_empty());
    }

    #[test]
    fn country_fields_by_category() {
        assert_eq!(country_fields(EquipmentType::VoltageLevel), [FieldType::Country]);
        assert_eq!(
            country_fields(EquipmentType::TwoWindingsTransformer),
            [FieldType::Country]
        );
        assert_eq!(
            country_fields(EquipmentType::Line),
            [FieldType::Country1, FieldType::Country2]
        );
        assert!(country_fields(EquipmentType::Generator).is_empty());
    }

    #[test]
    fn substation_property_fields_by_category() {
        assert_eq!(
            substation_property_fields(EquipmentType::Line),
            [FieldType::SubstationProperties1, FieldType::SubstationProperties2]
        );
        for t in [
            EquipmentType::Generator,
            EquipmentType::Load,
            EquipmentType::VoltageLevel,
            EquipmentType::Substation,
        ] {
            assert_eq!(substation_property_fields(t), [FieldType::SubstationProperties]);
        }
    }

    #[test]
    fn voltage_level_id_fields_cover_every_side() {
        for t in EquipmentType::ALL {
            let fields = voltage_level_id_fields(t);
            if t == EquipmentType::VoltageLevel || t == EquipmentType::Substation {
                assert!(fields.is_empty(), "{}", t);
            } else {
                assert_eq!(fields.len(), t.side_count(), "{}", t);
            }
        }
    }

    #[test]
    fn voltage_level_id_fields_by_category() {
        assert_eq!(
            voltage_level_id_fields(EquipmentType::Line),
            [FieldType::VoltageLevelId1, FieldType::VoltageLevelId2]
        );
        assert_eq!(
            voltage_level_id_fields(EquipmentType::HvdcLine),
            [FieldType::VoltageLevelId1, FieldType::VoltageLevelId2]
        );
        assert_eq!(
            voltage_level_id_fields(EquipmentType::ThreeWindingsTransformer),
            [
                FieldType::VoltageLevelId1,
                FieldType::VoltageLevelId2,
                FieldType::VoltageLevelId3
            ]
        );
        assert_eq!(
            voltage_level_id_fields(EquipmentType::Generator),
            [FieldType::VoltageLevelId]
        );
        assert!(voltage_level_id_fields(EquipmentType::VoltageLevel).is_empty());
        assert!(voltage_level_id_fields(EquipmentType::Substation).is_empty());
    }
}
