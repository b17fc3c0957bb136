use serde::Serialize;

/// The fixed set of database principals this crate provisions.
///
/// Role names are never taken from input; every statement that names a role
/// goes through this enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    Maintenance,
    Analytics1,
    Analytics2,
}

/// Privilege profile attached to a principal at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privileges {
    /// All privileges on the target database.
    DatabaseOwner,
    /// SELECT on every table in the `public` schema.
    ReadOnlyPublic,
}

impl Principal {
    pub const ALL: [Principal; 3] = [
        Principal::Maintenance,
        Principal::Analytics1,
        Principal::Analytics2,
    ];

    pub fn role_name(self) -> &'static str {
        match self {
            Principal::Maintenance => "maintenance",
            Principal::Analytics1 => "analytics_user1",
            Principal::Analytics2 => "analytics_user2",
        }
    }

    /// Last path segment of the secure parameter holding this role's password.
    pub fn parameter_leaf(self) -> &'static str {
        match self {
            Principal::Maintenance => "maintenance_password",
            Principal::Analytics1 => "analytics_password1",
            Principal::Analytics2 => "analytics_password2",
        }
    }

    pub fn privileges(self) -> Privileges {
        match self {
            Principal::Maintenance => Privileges::DatabaseOwner,
            Principal::Analytics1 | Principal::Analytics2 => Privileges::ReadOnlyPublic,
        }
    }

    /// Full parameter name under `prefix`, e.g. `/db/maintenance_password`.
    pub fn parameter_name(self, prefix: &str) -> String {
        format!("{}/{}", prefix.trim_end_matches('/'), self.parameter_leaf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefix_yields_well_known_names() {
        let names: Vec<String> = Principal::ALL
            .iter()
            .map(|p| p.parameter_name("/db"))
            .collect();
        assert_eq!(
            names,
            vec![
                "/db/maintenance_password",
                "/db/analytics_password1",
                "/db/analytics_password2"
            ]
        );
    }

    #[test]
    fn trailing_slash_in_prefix_is_ignored() {
        assert_eq!(
            Principal::Analytics2.parameter_name("/jettrails/db/"),
            "/jettrails/db/analytics_password2"
        );
    }

    #[test]
    fn only_maintenance_owns_the_database() {
        assert_eq!(
            Principal::Maintenance.privileges(),
            Privileges::DatabaseOwner
        );
        assert_eq!(
            Principal::Analytics1.privileges(),
            Privileges::ReadOnlyPublic
        );
        assert_eq!(
            Principal::Analytics2.privileges(),
            Privileges::ReadOnlyPublic
        );
    }
}
