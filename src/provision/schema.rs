use crate::db::schema::SCHEMA_STATEMENTS;
use crate::error::ProvisionError;
use sqlx::PgConnection;
use tracing::debug;

/// Issues the registry DDL on a caller-owned connection (normally inside
/// the provisioning transaction).
pub struct SchemaProvisioner;

impl SchemaProvisioner {
    /// Create tables, dedup function and trigger if absent. Returns the
    /// names of the objects ensured, in creation order.
    pub async fn ensure(conn: &mut PgConnection) -> Result<Vec<&'static str>, ProvisionError> {
        let mut ensured = Vec::with_capacity(SCHEMA_STATEMENTS.len());
        for (object, ddl) in SCHEMA_STATEMENTS {
            sqlx::query(ddl)
                .execute(&mut *conn)
                .await
                .map_err(|e| ProvisionError::Schema {
                    object,
                    message: e.to_string(),
                })?;
            debug!(object, "schema object ensured");
            ensured.push(object);
        }
        Ok(ensured)
    }
}
