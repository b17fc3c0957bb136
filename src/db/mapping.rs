//! Column mapping applied by the ETL collaborator between the published
//! registry export and [`REGISTRY_TABLE`](super::schema::REGISTRY_TABLE).

use crate::db::models::{NewRegistryRecord, RegistryFields};
use std::collections::HashMap;

/// (source column, target column). Every target is text; `numero_serie`
/// is kept as text rather than cast, so non-numeric serials survive.
pub const SOURCE_COLUMNS: [(&str, &str); 13] = [
    ("immatriculation", "registration"),
    ("constructeur", "manufacturer"),
    ("modele", "type_aircraft"),
    ("numero_serie", "serial_number"),
    ("aerodrome_attache", "home_airfield"),
    ("proprietaire", "owner_lessor"),
    ("adresse_proprietaire", "owner_address"),
    ("locataire", "beneficiary"),
    ("adresse_locataire", "beneficiary_address"),
    ("creancier_hypotheque", "creditor"),
    ("adresse_creancier", "creditor_address"),
    ("personne_saisissante", "seizing_entity"),
    ("adresse_personne_saisissante", "seizing_entity_address"),
];

pub fn target_column(source: &str) -> Option<&'static str> {
    SOURCE_COLUMNS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(source.trim()))
        .map(|(_, t)| *t)
}

impl NewRegistryRecord {
    /// Build a row from one source record keyed by source column name.
    /// Blank values become NULL; unknown columns (partition keys and the
    /// like) are ignored.
    pub fn from_source_row(row: &HashMap<String, String>) -> Self {
        let mut fields = RegistryFields::default();
        for (column, value) in row {
            let Some(slot) = target_column(column).and_then(|t| fields.column_mut(t)) else {
                continue;
            };
            let value = value.trim();
            *slot = (!value.is_empty()).then(|| value.to_string());
        }
        fields.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::DESCRIPTIVE_COLUMNS;

    #[test]
    fn mapping_targets_are_exactly_the_descriptive_columns() {
        let targets: Vec<&str> = SOURCE_COLUMNS.iter().map(|(_, t)| *t).collect();
        assert_eq!(targets, DESCRIPTIVE_COLUMNS.to_vec());
    }

    #[test]
    fn every_target_has_a_field_slot() {
        let mut fields = RegistryFields::default();
        for (_, target) in SOURCE_COLUMNS {
            assert!(fields.column_mut(target).is_some(), "{target}");
        }
        assert!(fields.column_mut("timestamp").is_none());
    }

    #[test]
    fn source_row_maps_trims_and_nulls_blanks() {
        let row: HashMap<String, String> = [
            ("immatriculation", " F-GABC "),
            ("constructeur", "ROBIN"),
            ("numero_serie", "A-12/bis"),
            ("locataire", "   "),
            ("year", "2024"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let rec = NewRegistryRecord::from_source_row(&row);
        assert_eq!(rec.timestamp, None);
        assert_eq!(rec.fields.registration.as_deref(), Some("F-GABC"));
        assert_eq!(rec.fields.manufacturer.as_deref(), Some("ROBIN"));
        assert_eq!(rec.fields.serial_number.as_deref(), Some("A-12/bis"));
        assert_eq!(rec.fields.beneficiary, None);
        assert_eq!(rec.fields.owner_lessor, None);
    }

    #[test]
    fn source_column_lookup_is_case_insensitive() {
        assert_eq!(target_column("Immatriculation"), Some("registration"));
        assert_eq!(target_column("month"), None);
    }
}
