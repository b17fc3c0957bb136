use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The 13 free-text descriptive fields shared by both registry tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash, FromRow)]
pub struct RegistryFields {
    pub registration: Option<String>,
    pub manufacturer: Option<String>,
    pub type_aircraft: Option<String>,
    pub serial_number: Option<String>,
    pub home_airfield: Option<String>,
    pub owner_lessor: Option<String>,
    pub owner_address: Option<String>,
    pub beneficiary: Option<String>,
    pub beneficiary_address: Option<String>,
    pub creditor: Option<String>,
    pub creditor_address: Option<String>,
    pub seizing_entity: Option<String>,
    pub seizing_entity_address: Option<String>,
}

impl RegistryFields {
    /// Mutable slot for a target column name, `None` for unknown columns.
    pub fn column_mut(&mut self, column: &str) -> Option<&mut Option<String>> {
        let slot = match column {
            "registration" => &mut self.registration,
            "manufacturer" => &mut self.manufacturer,
            "type_aircraft" => &mut self.type_aircraft,
            "serial_number" => &mut self.serial_number,
            "home_airfield" => &mut self.home_airfield,
            "owner_lessor" => &mut self.owner_lessor,
            "owner_address" => &mut self.owner_address,
            "beneficiary" => &mut self.beneficiary,
            "beneficiary_address" => &mut self.beneficiary_address,
            "creditor" => &mut self.creditor,
            "creditor_address" => &mut self.creditor_address,
            "seizing_entity" => &mut self.seizing_entity,
            "seizing_entity_address" => &mut self.seizing_entity_address,
            _ => return None,
        };
        Some(slot)
    }

    pub fn is_empty(&self) -> bool {
        *self == RegistryFields::default()
    }
}

/// A row of the append-only registry table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct RegistryRecord {
    pub id: i32,
    pub timestamp: Option<NaiveDateTime>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: RegistryFields,
}

/// A row of the deduplicated table; same shape, different invariant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct UniqueRegistryRecord {
    pub id: i32,
    pub timestamp: Option<NaiveDateTime>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: RegistryFields,
}

/// An observation about to be appended. A missing timestamp takes the
/// column default (insertion time).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewRegistryRecord {
    pub timestamp: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub fields: RegistryFields,
}

impl From<RegistryFields> for NewRegistryRecord {
    fn from(fields: RegistryFields) -> Self {
        Self {
            timestamp: None,
            fields,
        }
    }
}
