//! Binary / schema version compatibility gate
//!
//! The compiled binary and the SQL objects installed for the extension must
//! agree on a version before indexes are touched. The check runs one catalog
//! query per session and caches the answer in [`VersionState`].
//!
//! Workers without an active snapshot cannot run catalog queries. For those
//! the gate resets its cache and answers "compatible": such workers only run
//! after a leader that had a snapshot already performed the real check.

use crate::error::{LdbError, Result};
use crate::types::Config;

use tracing::{debug, warn};

/// Query access to the schema catalog
pub trait SchemaCatalog {
    /// Whether a transactional snapshot is established for this context
    fn active_snapshot(&self) -> bool;

    /// Run a read-only query returning one text column.
    ///
    /// Connection problems are reported as [`LdbError::CatalogConnect`] and
    /// execution problems as [`LdbError::QueryFailed`].
    fn select_text(&mut self, query: &str) -> Result<Vec<Option<String>>>;
}

/// Cached outcome of the version check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionState {
    pub checked: bool,
    pub matches: bool,
}

/// Compare two version strings over the longer of the two lengths, so a
/// truncated or empty value never compares equal to a longer one. Rust
/// strings may hold NUL bytes, so a shorter string is never padded out.
pub fn versions_equal(schema_version: &str, binary_version: &str) -> bool {
    schema_version.len() == binary_version.len()
        && schema_version.as_bytes() == binary_version.as_bytes()
}

/// Extension names are spliced into catalog SQL, so only `[a-z0-9_]+` is accepted
pub fn validate_extension_name(name: &str) -> Result<()> {
    if name.is_empty()
        || !name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    {
        return Err(LdbError::InvalidConfig(format!(
            "extension name must match [a-z0-9_]+, got {:?}",
            name
        )));
    }
    Ok(())
}

/// Session-owned version check with a one-shot cache
#[derive(Debug, Clone)]
pub struct VersionGate {
    state: VersionState,
    binary_version: String,
    extension_name: String,
}

impl VersionGate {
    pub fn new(
        binary_version: impl Into<String>,
        extension_name: impl Into<String>,
    ) -> Result<Self> {
        let extension_name = extension_name.into();
        validate_extension_name(&extension_name)?;
        Ok(Self {
            state: VersionState::default(),
            binary_version: binary_version.into(),
            extension_name,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.binary_version.clone(), config.extension_name.clone())
    }

    pub fn state(&self) -> VersionState {
        self.state
    }

    pub fn binary_version(&self) -> &str {
        &self.binary_version
    }

    /// Catalog query that yields the installed extension version
    pub fn query(&self) -> String {
        format!(
            "SELECT extversion FROM pg_extension WHERE extname = '{}'",
            self.extension_name
        )
    }

    /// Whether the binary version matches the schema version.
    ///
    /// A mismatch is reported as a warning, never as an error; the caller
    /// decides whether to proceed. Errors mean the catalog could not be
    /// queried or returned something other than exactly one non-null value.
    pub fn versions_match(&mut self, catalog: &mut dyn SchemaCatalog) -> Result<bool> {
        if !catalog.active_snapshot() {
            if self.state.checked {
                debug!("no active snapshot, resetting version check");
            }
            self.state = VersionState::default();
            return Ok(true);
        }

        if self.state.checked {
            return Ok(self.state.matches);
        }

        let query = self.query();
        let rows = catalog.select_text(&query)?;
        if rows.len() != 1 {
            return Err(LdbError::VersionQuery(format!(
                "SQL version query returned {} rows, expected 1",
                rows.len()
            )));
        }
        let schema_version = rows
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| LdbError::VersionQuery("version query returned null".to_string()))?;

        let matches = versions_equal(&schema_version, &self.binary_version);
        self.state = VersionState {
            checked: true,
            matches,
        };
        debug!(
            schema_version = %schema_version,
            binary_version = %self.binary_version,
            matches,
            "version checked"
        );

        if !matches {
            warn!(
                "binary version ({}) does not match the version in SQL ({}). This can cause \
                 errors as the two APIs may differ. Please run `ALTER EXTENSION {} UPDATE` and \
                 reconnect before attempting to work with indices",
                self.binary_version, schema_version, self.extension_name
            );
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::capture_logs;
    use rusqlite::Connection;

    /// Catalog backed by an in-memory SQLite database with a `pg_extension` table
    struct SqliteCatalog {
        conn: Connection,
        snapshot: bool,
        queries: usize,
    }

    impl SqliteCatalog {
        fn new(versions: &[(&str, Option<&str>)]) -> Self {
            let conn = Connection::open_in_memory().unwrap();
            conn.execute(
                "CREATE TABLE pg_extension (extname TEXT NOT NULL, extversion TEXT)",
                [],
            )
            .unwrap();
            for (name, version) in versions {
                conn.execute(
                    "INSERT INTO pg_extension (extname, extversion) VALUES (?1, ?2)",
                    rusqlite::params![name, version],
                )
                .unwrap();
            }
            Self { conn, snapshot: true, queries: 0 }
        }

        fn set_version(&self, version: &str) {
            self.conn
                .execute("UPDATE pg_extension SET extversion = ?1", [version])
                .unwrap();
        }
    }

    impl SchemaCatalog for SqliteCatalog {
        fn active_snapshot(&self) -> bool {
            self.snapshot
        }

        fn select_text(&mut self, query: &str) -> Result<Vec<Option<String>>> {
            self.queries += 1;
            let failed = |e: rusqlite::Error| LdbError::QueryFailed {
                query: query.to_string(),
                reason: e.to_string(),
            };
            let mut stmt = self.conn.prepare(query).map_err(failed)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, Option<String>>(0))
                .map_err(failed)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(failed)
        }
    }

    struct BrokenCatalog;

    impl SchemaCatalog for BrokenCatalog {
        fn active_snapshot(&self) -> bool {
            true
        }

        fn select_text(&mut self, _query: &str) -> Result<Vec<Option<String>>> {
            Err(LdbError::CatalogConnect("executor unavailable".to_string()))
        }
    }

    #[test]
    fn test_versions_equal() {
        assert!(versions_equal("1.0.0", "1.0.0"));
        assert!(!versions_equal("1.0.1", "1.0.0"));
        assert!(!versions_equal("0.1", "0.1.2"));
        assert!(!versions_equal("0.1.2", "0.1"));
        assert!(!versions_equal("", "0.1.2"));
        assert!(!versions_equal("1.0.0\0", "1.0.0"));
        assert!(!versions_equal("1.0.0", "1.0.0\0"));
    }

    #[test]
    fn test_match_is_cached() {
        let mut catalog = SqliteCatalog::new(&[("lantern", Some("1.0.0"))]);
        let mut gate = VersionGate::new("1.0.0", "lantern").unwrap();

        assert!(gate.versions_match(&mut catalog).unwrap());
        assert_eq!(gate.state(), VersionState { checked: true, matches: true });

        // later schema changes are not seen until the cache is reset
        catalog.set_version("2.0.0");
        for _ in 0..5 {
            assert!(gate.versions_match(&mut catalog).unwrap());
        }
        assert_eq!(catalog.queries, 1);
    }

    #[test]
    fn test_mismatch_is_cached() {
        let mut catalog = SqliteCatalog::new(&[("lantern", Some("1.0.1"))]);
        let mut gate = VersionGate::new("1.0.0", "lantern").unwrap();

        assert!(!gate.versions_match(&mut catalog).unwrap());
        assert!(!gate.versions_match(&mut catalog).unwrap());
        assert_eq!(gate.state(), VersionState { checked: true, matches: false });
        assert_eq!(catalog.queries, 1);
    }

    #[test]
    fn test_truncated_schema_version_mismatches() {
        let mut catalog = SqliteCatalog::new(&[("lantern", Some("0.1"))]);
        let mut gate = VersionGate::new("0.1.2", "lantern").unwrap();
        assert!(!gate.versions_match(&mut catalog).unwrap());
    }

    #[test]
    fn test_no_snapshot_soft_passes() {
        let mut catalog = SqliteCatalog::new(&[("lantern", Some("9.9.9"))]);
        catalog.snapshot = false;
        let mut gate = VersionGate::new("1.0.0", "lantern").unwrap();

        assert!(gate.versions_match(&mut catalog).unwrap());
        assert_eq!(gate.state(), VersionState::default());
        assert_eq!(catalog.queries, 0);
    }

    #[test]
    fn test_no_snapshot_resets_cache() {
        let mut catalog = SqliteCatalog::new(&[("lantern", Some("9.9.9"))]);
        let mut gate = VersionGate::new("1.0.0", "lantern").unwrap();

        assert!(!gate.versions_match(&mut catalog).unwrap());
        catalog.snapshot = false;
        assert!(gate.versions_match(&mut catalog).unwrap());
        assert_eq!(gate.state(), VersionState::default());

        // the next call with a snapshot queries again
        catalog.snapshot = true;
        catalog.set_version("1.0.0");
        assert!(gate.versions_match(&mut catalog).unwrap());
        assert_eq!(catalog.queries, 2);
    }

    #[test]
    fn test_missing_extension_is_fatal() {
        let mut catalog = SqliteCatalog::new(&[("other", Some("1.0.0"))]);
        let mut gate = VersionGate::new("1.0.0", "lantern").unwrap();

        assert!(matches!(gate.versions_match(&mut catalog), Err(LdbError::VersionQuery(_))));
        assert!(!gate.state().checked);
    }

    #[test]
    fn test_multiple_rows_are_fatal() {
        let mut catalog =
            SqliteCatalog::new(&[("lantern", Some("1.0.0")), ("lantern", Some("1.0.0"))]);
        let mut gate = VersionGate::new("1.0.0", "lantern").unwrap();
        assert!(matches!(gate.versions_match(&mut catalog), Err(LdbError::VersionQuery(_))));
    }

    #[test]
    fn test_null_version_is_fatal() {
        let mut catalog = SqliteCatalog::new(&[("lantern", None)]);
        let mut gate = VersionGate::new("1.0.0", "lantern").unwrap();
        assert!(matches!(gate.versions_match(&mut catalog), Err(LdbError::VersionQuery(_))));
    }

    #[test]
    fn test_catalog_errors_propagate() {
        let mut gate = VersionGate::new("1.0.0", "lantern").unwrap();
        assert!(matches!(
            gate.versions_match(&mut BrokenCatalog),
            Err(LdbError::CatalogConnect(_))
        ));

        let mut catalog = SqliteCatalog::new(&[]);
        catalog.conn.execute("DROP TABLE pg_extension", []).unwrap();
        assert!(matches!(
            gate.versions_match(&mut catalog),
            Err(LdbError::QueryFailed { .. })
        ));
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            binary_version: "0.3.0".to_string(),
            extension_name: "vec_ext".to_string(),
            ..Default::default()
        };
        let gate = VersionGate::from_config(&config).unwrap();
        assert_eq!(gate.binary_version(), "0.3.0");
        assert!(gate.query().ends_with("extname = 'vec_ext'"));
    }

    #[test]
    fn test_new_rejects_unsafe_extension_name() {
        assert!(matches!(
            VersionGate::new("1.0", "x' OR '1'='1"),
            Err(LdbError::InvalidConfig(_))
        ));
        assert!(VersionGate::new("1.0", "").is_err());
        assert!(VersionGate::new("1.0", "Lantern").is_err());
        assert!(VersionGate::new("1.0", "lantern_extras2").is_ok());
    }

    #[test]
    fn test_mismatch_warning_names_both_versions() {
        let mut catalog = SqliteCatalog::new(&[("lantern", Some("1.0.1"))]);
        let mut gate = VersionGate::new("1.0.0", "lantern").unwrap();

        let (matches, logs) = capture_logs(|| gate.versions_match(&mut catalog).unwrap());
        assert!(!matches);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("binary version (1.0.0)"));
        assert!(logs.contains("version in SQL (1.0.1)"));
        assert!(logs.contains("ALTER EXTENSION lantern UPDATE"));

        // cached answers do not warn again
        let (_, logs) = capture_logs(|| gate.versions_match(&mut catalog).unwrap());
        assert!(!logs.contains("WARN"));
    }

    #[test]
    fn test_match_does_not_warn() {
        let mut catalog = SqliteCatalog::new(&[("lantern", Some("1.0.0"))]);
        let mut gate = VersionGate::new("1.0.0", "lantern").unwrap();

        let (matches, logs) = capture_logs(|| gate.versions_match(&mut catalog).unwrap());
        assert!(matches);
        assert!(!logs.contains("WARN"));
    }
}
