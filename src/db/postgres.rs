use crate::db::models::{NewRegistryRecord, RegistryFields, RegistryRecord, UniqueRegistryRecord};
use crate::error::ProvisionError;
use futures::TryStreamExt;
use sqlx::postgres::PgArguments;
use sqlx::{Pool, Postgres};

pub type PgPool = Pool<Postgres>;

const INSERT_RECORD: &str = r#"
    INSERT INTO jettrailtable (
        timestamp, registration, manufacturer, type_aircraft,
        serial_number, home_airfield, owner_lessor, owner_address,
        beneficiary, beneficiary_address, creditor, creditor_address,
        seizing_entity, seizing_entity_address
    ) VALUES (
        COALESCE($1, LOCALTIMESTAMP), $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14
    )
    RETURNING id
"#;

/// Read/append access to the two registry tables.
///
/// Appends are blind: deduplication happens in the table trigger, not here.
#[derive(Clone)]
pub struct RegistryStorage {
    pool: PgPool,
}

impl RegistryStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Append one observation. Returns the new row id.
    pub async fn append(&self, record: &NewRegistryRecord) -> Result<i32, ProvisionError> {
        let (id,): (i32,) = bind_record(sqlx::query_as(INSERT_RECORD), record)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    /// Append a batch in one transaction. Returns ids in input order.
    pub async fn append_many(
        &self,
        records: &[NewRegistryRecord],
    ) -> Result<Vec<i32>, ProvisionError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            let (id,): (i32,) = bind_record(sqlx::query_as(INSERT_RECORD), record)
                .fetch_one(&mut *tx)
                .await?;
            ids.push(id);
        }

        tx.commit().await?;
        Ok(ids)
    }

    pub async fn count_records(&self) -> Result<i64, ProvisionError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jettrailtable")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn count_unique(&self) -> Result<i64, ProvisionError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM unique_jettrailtable")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn list_records(&self) -> Result<Vec<RegistryRecord>, ProvisionError> {
        let rows = sqlx::query_as::<_, RegistryRecord>(
            r#"SELECT id, timestamp, registration, manufacturer, type_aircraft,
               serial_number, home_airfield, owner_lessor, owner_address,
               beneficiary, beneficiary_address, creditor, creditor_address,
               seizing_entity, seizing_entity_address
               FROM jettrailtable ORDER BY id"#,
        )
        .fetch(&self.pool)
        .try_collect()
        .await?;
        Ok(rows)
    }

    pub async fn list_unique(&self) -> Result<Vec<UniqueRegistryRecord>, ProvisionError> {
        let rows = sqlx::query_as::<_, UniqueRegistryRecord>(
            r#"SELECT id, timestamp, registration, manufacturer, type_aircraft,
               serial_number, home_airfield, owner_lessor, owner_address,
               beneficiary, beneficiary_address, creditor, creditor_address,
               seizing_entity, seizing_entity_address
               FROM unique_jettrailtable ORDER BY id"#,
        )
        .fetch(&self.pool)
        .try_collect()
        .await?;
        Ok(rows)
    }
}

type QueryAs<'q, O> = sqlx::query::QueryAs<'q, Postgres, O, PgArguments>;

fn bind_record<'q, O>(query: QueryAs<'q, O>, record: &'q NewRegistryRecord) -> QueryAs<'q, O> {
    let query = query.bind(record.timestamp);
    bind_fields(query, &record.fields)
}

fn bind_fields<'q, O>(query: QueryAs<'q, O>, f: &'q RegistryFields) -> QueryAs<'q, O> {
    query
        .bind(f.registration.as_deref())
        .bind(f.manufacturer.as_deref())
        .bind(f.type_aircraft.as_deref())
        .bind(f.serial_number.as_deref())
        .bind(f.home_airfield.as_deref())
        .bind(f.owner_lessor.as_deref())
        .bind(f.owner_address.as_deref())
        .bind(f.beneficiary.as_deref())
        .bind(f.beneficiary_address.as_deref())
        .bind(f.creditor.as_deref())
        .bind(f.creditor_address.as_deref())
        .bind(f.seizing_entity.as_deref())
        .bind(f.seizing_entity_address.as_deref())
}
