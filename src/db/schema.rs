//! SQL DDL for the registry tables and the dedup trigger.
//! Postgres dialect; every statement is safe to re-run.

/// Append-only table receiving every ingested observation.
pub const REGISTRY_TABLE: &str = "jettrailtable";

/// Deduplicated projection of [`REGISTRY_TABLE`].
pub const UNIQUE_TABLE: &str = "unique_jettrailtable";

pub const DEDUP_FUNCTION: &str = "insert_if_unique";

pub const DEDUP_TRIGGER: &str = "before_insert_insert_if_unique";

/// The 13 descriptive columns, in table order. Together they form the
/// uniqueness key of [`UNIQUE_TABLE`]; `timestamp` is not part of it.
pub const DESCRIPTIVE_COLUMNS: [&str; 13] = [
    "registration",
    "manufacturer",
    "type_aircraft",
    "serial_number",
    "home_airfield",
    "owner_lessor",
    "owner_address",
    "beneficiary",
    "beneficiary_address",
    "creditor",
    "creditor_address",
    "seizing_entity",
    "seizing_entity_address",
];

pub const CREATE_REGISTRY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS jettrailtable (
    id SERIAL PRIMARY KEY,
    timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    registration VARCHAR(255),
    manufacturer VARCHAR(255),
    type_aircraft VARCHAR(255),
    serial_number VARCHAR(255),
    home_airfield VARCHAR(255),
    owner_lessor VARCHAR(255),
    owner_address VARCHAR(255),
    beneficiary VARCHAR(255),
    beneficiary_address VARCHAR(255),
    creditor VARCHAR(255),
    creditor_address VARCHAR(255),
    seizing_entity VARCHAR(255),
    seizing_entity_address VARCHAR(255)
)
"#;

/// NULLs stay distinct under the UNIQUE constraint (Postgres default), so
/// all-null rows never conflict with each other.
pub const CREATE_UNIQUE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS unique_jettrailtable (
    id SERIAL PRIMARY KEY,
    timestamp TIMESTAMP,
    registration VARCHAR(255),
    manufacturer VARCHAR(255),
    type_aircraft VARCHAR(255),
    serial_number VARCHAR(255),
    home_airfield VARCHAR(255),
    owner_lessor VARCHAR(255),
    owner_address VARCHAR(255),
    beneficiary VARCHAR(255),
    beneficiary_address VARCHAR(255),
    creditor VARCHAR(255),
    creditor_address VARCHAR(255),
    seizing_entity VARCHAR(255),
    seizing_entity_address VARCHAR(255),
    UNIQUE (registration, manufacturer, type_aircraft, serial_number, home_airfield,
            owner_lessor, owner_address, beneficiary, beneficiary_address,
            creditor, creditor_address, seizing_entity, seizing_entity_address)
)
"#;

/// Insert-missing, ignore-duplicate. The conflict check is the unique
/// index itself, so concurrent ingestion runs need no extra locking.
pub const CREATE_DEDUP_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION insert_if_unique()
RETURNS TRIGGER AS $$
BEGIN
    INSERT INTO unique_jettrailtable (
        timestamp, registration, manufacturer, type_aircraft,
        serial_number, home_airfield, owner_lessor, owner_address,
        beneficiary, beneficiary_address, creditor, creditor_address,
        seizing_entity, seizing_entity_address
    ) VALUES (
        NEW.timestamp, NEW.registration, NEW.manufacturer, NEW.type_aircraft,
        NEW.serial_number, NEW.home_airfield, NEW.owner_lessor, NEW.owner_address,
        NEW.beneficiary, NEW.beneficiary_address, NEW.creditor, NEW.creditor_address,
        NEW.seizing_entity, NEW.seizing_entity_address
    )
    ON CONFLICT DO NOTHING;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql
"#;

/// `CREATE OR REPLACE TRIGGER` needs Postgres 14; guard on `pg_trigger` instead.
pub const CREATE_DEDUP_TRIGGER: &str = r#"
DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1 FROM pg_trigger
        WHERE tgname = 'before_insert_insert_if_unique'
          AND tgrelid = 'jettrailtable'::regclass
    ) THEN
        CREATE TRIGGER before_insert_insert_if_unique
        BEFORE INSERT ON jettrailtable
        FOR EACH ROW EXECUTE FUNCTION insert_if_unique();
    END IF;
END
$$
"#;

/// Schema objects in creation order, each paired with its DDL.
pub const SCHEMA_STATEMENTS: [(&str, &str); 4] = [
    (REGISTRY_TABLE, CREATE_REGISTRY_TABLE),
    (UNIQUE_TABLE, CREATE_UNIQUE_TABLE),
    (DEDUP_FUNCTION, CREATE_DEDUP_FUNCTION),
    (DEDUP_TRIGGER, CREATE_DEDUP_TRIGGER),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn squash(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn unique_key_covers_every_descriptive_column_but_not_timestamp() {
        let ddl = squash(CREATE_UNIQUE_TABLE);
        let key = format!("UNIQUE ({})", DESCRIPTIVE_COLUMNS.join(", "));
        assert!(ddl.contains(&key), "missing {key} in {ddl}");
    }

    #[test]
    fn both_tables_declare_every_descriptive_column() {
        for ddl in [CREATE_REGISTRY_TABLE, CREATE_UNIQUE_TABLE] {
            for col in DESCRIPTIVE_COLUMNS {
                assert!(ddl.contains(&format!("{col} VARCHAR(255)")), "{col}");
            }
        }
    }

    #[test]
    fn every_statement_is_rerunnable() {
        assert!(CREATE_REGISTRY_TABLE.contains("IF NOT EXISTS"));
        assert!(CREATE_UNIQUE_TABLE.contains("IF NOT EXISTS"));
        assert!(CREATE_DEDUP_FUNCTION.contains("CREATE OR REPLACE FUNCTION"));
        assert!(CREATE_DEDUP_TRIGGER.contains("IF NOT EXISTS"));
    }

    #[test]
    fn dedup_ignores_conflicts_instead_of_updating() {
        let body = squash(CREATE_DEDUP_FUNCTION);
        assert!(body.contains("ON CONFLICT DO NOTHING"));
        assert!(!body.contains("DO UPDATE"));
        assert!(body.contains("RETURN NEW"));
    }

    #[test]
    fn trigger_fires_before_each_insert() {
        let body = squash(CREATE_DEDUP_TRIGGER);
        assert!(body.contains(&format!(
            "BEFORE INSERT ON {REGISTRY_TABLE} FOR EACH ROW EXECUTE FUNCTION {DEDUP_FUNCTION}()"
        )));
    }
}
