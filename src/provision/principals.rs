use crate::config::RoleConflictPolicy;
use crate::credentials::Credential;
use crate::error::ProvisionError;
use crate::types::{Principal, Privileges};
use sqlx::PgConnection;
use tracing::{info, warn};

/// Postgres quotes role names (`%I`) and password literals (`%L`) server-side;
/// the secret only ever travels as a bound parameter.
const CREATE_ROLE: &str = "SELECT format('CREATE USER %I WITH PASSWORD %L', $1::text, $2::text)";
const ROTATE_ROLE: &str =
    "SELECT format('ALTER USER %I WITH LOGIN PASSWORD %L', $1::text, $2::text)";
const GRANT_DATABASE: &str =
    "SELECT format('GRANT ALL PRIVILEGES ON DATABASE %I TO %I', $1::text, $2::text)";
const GRANT_READ_ONLY: &str =
    "SELECT format('GRANT SELECT ON ALL TABLES IN SCHEMA public TO %I', $1::text)";

/// What happened to one principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalOutcome {
    Created(Principal),
    Rotated(Principal),
}

impl PrincipalOutcome {
    pub fn principal(self) -> Principal {
        match self {
            PrincipalOutcome::Created(p) | PrincipalOutcome::Rotated(p) => p,
        }
    }
}

/// Creates the fixed database roles and their grants.
#[derive(Debug, Clone)]
pub struct PrincipalProvisioner<'a> {
    database: &'a str,
    policy: RoleConflictPolicy,
}

impl<'a> PrincipalProvisioner<'a> {
    pub fn new(database: &'a str, policy: RoleConflictPolicy) -> Self {
        Self { database, policy }
    }

    /// Create (or, under [`RoleConflictPolicy::Rotate`], re-key) the role for
    /// `credential` and apply its grant.
    pub async fn ensure(
        &self,
        conn: &mut PgConnection,
        credential: &Credential,
    ) -> Result<PrincipalOutcome, ProvisionError> {
        let principal = credential.principal();
        let role = principal.role_name();
        let fail = |e: sqlx::Error| ProvisionError::PrincipalCreation {
            role,
            message: e.to_string(),
        };

        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM pg_roles WHERE rolname = $1)")
                .bind(role)
                .fetch_one(&mut *conn)
                .await
                .map_err(fail)?;

        let outcome = match (exists, self.policy) {
            (true, RoleConflictPolicy::Fail) => {
                warn!(
                    role,
                    "role already exists; its password no longer matches the stored parameter, \
                     re-run with ROLE_CONFLICT=rotate to re-key it"
                );
                return Err(ProvisionError::PrincipalCreation {
                    role,
                    message: format!(
                        "role \"{role}\" already exists (set ROLE_CONFLICT=rotate to re-key it)"
                    ),
                });
            }
            (true, RoleConflictPolicy::Rotate) => {
                warn!(role, "role exists; rotating its password");
                PrincipalOutcome::Rotated(principal)
            }
            (false, _) => PrincipalOutcome::Created(principal),
        };

        let keyed = match outcome {
            PrincipalOutcome::Created(_) => CREATE_ROLE,
            PrincipalOutcome::Rotated(_) => ROTATE_ROLE,
        };
        let statement = render(conn, keyed, &[role, credential.expose_secret()])
            .await
            .map_err(fail)?;
        execute(conn, &statement).await.map_err(fail)?;

        let grant = match principal.privileges() {
            Privileges::DatabaseOwner => render(conn, GRANT_DATABASE, &[self.database, role]).await,
            Privileges::ReadOnlyPublic => render(conn, GRANT_READ_ONLY, &[role]).await,
        }
        .map_err(fail)?;
        execute(conn, &grant).await.map_err(fail)?;

        info!(role, outcome = ?outcome, "principal provisioned");
        Ok(outcome)
    }
}

/// Ask the server to render a statement from a `format()` template.
async fn render(
    conn: &mut PgConnection,
    template: &'static str,
    args: &[&str],
) -> Result<String, sqlx::Error> {
    let query = args
        .iter()
        .fold(sqlx::query_as::<_, (String,)>(template), |q, a| q.bind(*a));
    let (statement,) = query.fetch_one(&mut *conn).await?;
    Ok(statement)
}

/// Run a rendered statement over the simple protocol so its text is never
/// cached as a prepared statement.
async fn execute(conn: &mut PgConnection, statement: &str) -> Result<(), sqlx::Error> {
    sqlx::Executor::execute(&mut *conn, statement).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::DEFAULT_PASSWORD_LENGTH;
    use crate::provision::schema::SchemaProvisioner;
    use sqlx::{Connection, PgPool};

    async fn current_database(conn: &mut PgConnection) -> String {
        let (db,): (String,) = sqlx::query_as("SELECT current_database()")
            .fetch_one(conn)
            .await
            .unwrap();
        db
    }

    async fn role_can_login(conn: &mut PgConnection, role: &str) -> bool {
        let (login,): (bool,) = sqlx::query_as("SELECT rolcanlogin FROM pg_roles WHERE rolname = $1")
            .bind(role)
            .fetch_one(conn)
            .await
            .unwrap();
        login
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL pointing at a Postgres instance"]
    async fn creates_all_roles_with_scoped_grants(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let db = current_database(&mut conn).await;
        // Roles are cluster-wide; keep them inside a transaction that is rolled back.
        let mut tx = conn.begin().await.unwrap();
        SchemaProvisioner::ensure(&mut tx).await.unwrap();

        let provisioner = PrincipalProvisioner::new(&db, RoleConflictPolicy::Fail);
        let creds = Credential::generate_all("/db", DEFAULT_PASSWORD_LENGTH);
        for cred in &creds {
            let outcome = provisioner.ensure(&mut tx, cred).await.unwrap();
            assert_eq!(outcome, PrincipalOutcome::Created(cred.principal()));
            assert!(role_can_login(&mut tx, cred.principal().role_name()).await);
        }

        let (analytics_can_select, analytics_can_insert): (bool, bool) = sqlx::query_as(
            "SELECT has_table_privilege('analytics_user1', 'jettrailtable', 'SELECT'), \
                    has_table_privilege('analytics_user1', 'jettrailtable', 'INSERT')",
        )
        .fetch_one(&mut *tx)
        .await
        .unwrap();
        assert!(analytics_can_select);
        assert!(!analytics_can_insert);

        let (maintenance_can_create,): (bool,) = sqlx::query_as(
            "SELECT has_database_privilege('maintenance', current_database(), 'CREATE')",
        )
        .fetch_one(&mut *tx)
        .await
        .unwrap();
        assert!(maintenance_can_create);

        tx.rollback().await.unwrap();
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL pointing at a Postgres instance"]
    async fn existing_role_fails_under_default_policy(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let db = current_database(&mut conn).await;
        let mut tx = conn.begin().await.unwrap();

        let provisioner = PrincipalProvisioner::new(&db, RoleConflictPolicy::Fail);
        let cred = Credential::new(Principal::Analytics2, "/db", "first'pass\\word".into());
        provisioner.ensure(&mut tx, &cred).await.unwrap();

        let err = provisioner.ensure(&mut tx, &cred).await.unwrap_err();
        match &err {
            ProvisionError::PrincipalCreation { role, message } => {
                assert_eq!(*role, "analytics_user2");
                assert!(message.contains("already exists"));
                assert!(message.contains("ROLE_CONFLICT=rotate"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.to_string().contains("first'pass"));

        tx.rollback().await.unwrap();
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL pointing at a Postgres instance"]
    async fn rendered_create_statement_escapes_the_secret(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let statement = render(&mut conn, CREATE_ROLE, &["analytics_user2", "it's\\x"])
            .await
            .unwrap();
        assert_eq!(
            statement,
            "CREATE USER analytics_user2 WITH PASSWORD E'it''s\\\\x'"
        );

        let quoted = render(&mut conn, CREATE_ROLE, &["Odd Name", "plain"])
            .await
            .unwrap();
        assert_eq!(quoted, "CREATE USER \"Odd Name\" WITH PASSWORD 'plain'");
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL pointing at a Postgres instance"]
    async fn existing_role_is_rekeyed_under_rotate_policy(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let db = current_database(&mut conn).await;
        let mut tx = conn.begin().await.unwrap();

        let provisioner = PrincipalProvisioner::new(&db, RoleConflictPolicy::Rotate);
        let first = Credential::new(Principal::Maintenance, "/db", "o'ne".into());
        let second = Credential::new(Principal::Maintenance, "/db", "t\\wo".into());

        assert_eq!(
            provisioner.ensure(&mut tx, &first).await.unwrap(),
            PrincipalOutcome::Created(Principal::Maintenance)
        );
        assert_eq!(
            provisioner.ensure(&mut tx, &second).await.unwrap(),
            PrincipalOutcome::Rotated(Principal::Maintenance)
        );

        tx.rollback().await.unwrap();
    }
}
