//! Natural-key-resolving CSV importer.
//!
//! One file is imported inside one transaction. Each row is parsed by column
//! name, checked against its natural key (skipped if it already exists), has
//! its reference resolved to a surrogate id, and is inserted. Rows whose
//! reference cannot be resolved are recorded and skipped. Database failures
//! roll the whole file back; rows that cannot be parsed follow the configured
//! [`RowFailurePolicy`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::booking_csv::open_reader;
use crate::booking_csv::reader::csv_error;
use crate::booking_csv::rows::{RoomCsvRow, UserCsvRow};
use crate::config::RowFailurePolicy;
use crate::db::repository::{ImportStore, Insert, Lookup};
use crate::error::Result;
use crate::models::{room::NewRoom, user::NewUser};

/// A CSV row type the importer knows how to reconcile with the database.
pub trait ImportRow: DeserializeOwned + Send {
    /// Record inserted once the reference has been resolved.
    type Record: Send + Sync;

    /// Entity name used in reports, e.g. `"users"`.
    const ENTITY: &'static str;
    /// Lookup that detects an existing row with the same natural key.
    const NATURAL_KEY: Lookup;
    /// Lookup that resolves the row's foreign-key reference.
    const REFERENCE: Lookup;

    fn natural_key(&self) -> &str;
    fn reference(&self) -> &str;
    fn to_record(&self, reference_id: i64) -> Result<Self::Record>;
}

impl ImportRow for UserCsvRow {
    type Record = NewUser;

    const ENTITY: &'static str = "users";
    const NATURAL_KEY: Lookup = Lookup::UserByEmail;
    const REFERENCE: Lookup = Lookup::RoleByName;

    fn natural_key(&self) -> &str {
        &self.email
    }

    fn reference(&self) -> &str {
        &self.role
    }

    fn to_record(&self, role_id: i64) -> Result<NewUser> {
        Ok(self.to_new_user(role_id))
    }
}

impl ImportRow for RoomCsvRow {
    type Record = NewRoom;

    const ENTITY: &'static str = "rooms";
    const NATURAL_KEY: Lookup = Lookup::RoomByNumber;
    const REFERENCE: Lookup = Lookup::BuildingByAddress;

    fn natural_key(&self) -> &str {
        &self.room_number
    }

    fn reference(&self) -> &str {
        &self.building_address
    }

    fn to_record(&self, building_id: i64) -> Result<NewRoom> {
        self.to_new_room(building_id)
    }
}

/// What happened to a single data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Imported {
        key: String,
        id: i64,
    },
    SkippedExisting {
        key: String,
    },
    MissingReference {
        key: String,
        lookup: Lookup,
        value: String,
    },
    /// The row could not be parsed or converted.
    Invalid {
        key: Option<String>,
        reason: String,
    },
}

impl RowOutcome {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            RowOutcome::MissingReference { .. } | RowOutcome::Invalid { .. }
        )
    }
}

/// A row outcome together with the CSV line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    pub line: u64,
    pub outcome: RowOutcome,
}

impl fmt::Display for RowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            RowOutcome::Imported { key, .. } => write!(f, "imported: {key}"),
            RowOutcome::SkippedExisting { key } => {
                write!(f, "skipped (already exists): {key}")
            }
            RowOutcome::MissingReference { key, lookup, value } => write!(
                f,
                "error: {} '{value}' not found for {key} (line {})",
                lookup.entity(),
                self.line
            ),
            RowOutcome::Invalid {
                key: Some(key),
                reason,
            } => write!(f, "error: {key} (line {}): {reason}", self.line),
            RowOutcome::Invalid { key: None, reason } => {
                write!(f, "error: line {}: {reason}", self.line)
            }
        }
    }
}

/// Final state of the file's transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    Committed,
    /// Everything inserted for the file was discarded.
    RolledBack { line: u64, reason: String },
    /// Processed as a real run, then rolled back on purpose.
    DryRun,
}

/// Outcome of importing one file.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub entity: &'static str,
    pub path: PathBuf,
    pub rows: Vec<RowReport>,
    pub status: ImportStatus,
}

impl ImportReport {
    /// Rows inserted in the transaction. They only persist when the status is
    /// [`ImportStatus::Committed`].
    pub fn imported(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Imported { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::SkippedExisting { .. }))
    }

    pub fn errors(&self) -> usize {
        self.count(RowOutcome::is_error)
    }

    pub fn is_committed(&self) -> bool {
        self.status == ImportStatus::Committed
    }

    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Imports CSV files through an [`ImportStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Importer {
    policy: RowFailurePolicy,
    dry_run: bool,
}

impl Importer {
    pub fn new(policy: RowFailurePolicy) -> Self {
        Self {
            policy,
            dry_run: false,
        }
    }

    /// Roll back at the end instead of committing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Import users (`name,email,role`).
    pub async fn import_users<S>(&self, path: &Path, store: S) -> Result<ImportReport>
    where
        S: Insert<NewUser>,
    {
        self.import_file::<UserCsvRow, S>(path, store).await
    }

    /// Import rooms (`room_number,capacity,floor,building_address`).
    pub async fn import_rooms<S>(&self, path: &Path, store: S) -> Result<ImportReport>
    where
        S: Insert<NewRoom>,
    {
        self.import_file::<RoomCsvRow, S>(path, store).await
    }

    /// Import every row of `path` inside `store`'s transaction.
    ///
    /// Returns an error only when the file cannot be opened or its header
    /// read; the transaction is rolled back in that case. Failures while
    /// processing rows are reported through [`ImportReport::status`].
    pub async fn import_file<R, S>(&self, path: &Path, mut store: S) -> Result<ImportReport>
    where
        R: ImportRow,
        S: Insert<R::Record>,
    {
        info!(entity = R::ENTITY, path = %path.display(), "Starting import");

        let opened = open_reader(path).and_then(|mut rdr| {
            let headers = rdr.headers().map_err(|e| csv_error(e, path))?.clone();
            Ok((rdr, headers))
        });
        let (mut rdr, headers) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                error!(entity = R::ENTITY, error = %e, "Cannot read import file");
                release(R::ENTITY, store).await;
                return Err(e);
            }
        };

        let mut report = ImportReport {
            entity: R::ENTITY,
            path: path.to_path_buf(),
            rows: Vec::new(),
            status: ImportStatus::Committed,
        };

        for (index, result) in rdr.records().enumerate() {
            // Header is line 1.
            let fallback_line = index as u64 + 2;

            let (line, outcome) = match result {
                Ok(record) => {
                    let line = record
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(fallback_line);
                    match record.deserialize::<R>(Some(&headers)) {
                        Ok(row) => match self.import_row(&row, &mut store).await {
                            Ok(outcome) => (line, outcome),
                            Err(e) => {
                                return Ok(abort(report, store, line, e.to_string()).await);
                            }
                        },
                        Err(e) => (
                            line,
                            RowOutcome::Invalid {
                                key: None,
                                reason: format!("malformed row: {e}"),
                            },
                        ),
                    }
                }
                Err(e) => (
                    e.position().map(|p| p.line()).unwrap_or(fallback_line),
                    RowOutcome::Invalid {
                        key: None,
                        reason: format!("malformed record: {e}"),
                    },
                ),
            };

            log_outcome(R::ENTITY, line, &outcome);

            if let RowOutcome::Invalid { reason, .. } = &outcome {
                if self.policy == RowFailurePolicy::Rollback {
                    let reason = reason.clone();
                    report.rows.push(RowReport { line, outcome });
                    return Ok(abort(report, store, line, reason).await);
                }
            }

            report.rows.push(RowReport { line, outcome });
        }

        if self.dry_run {
            store.rollback().await?;
            report.status = ImportStatus::DryRun;
        } else {
            store.commit().await?;
        }

        info!(
            entity = R::ENTITY,
            imported = report.imported(),
            skipped = report.skipped(),
            errors = report.errors(),
            dry_run = self.dry_run,
            "Import finished"
        );

        Ok(report)
    }

    /// Run the duplicate check, reference resolution and insert for one row.
    async fn import_row<R, S>(&self, row: &R, store: &mut S) -> Result<RowOutcome>
    where
        R: ImportRow,
        S: Insert<R::Record>,
    {
        let key = row.natural_key().to_string();

        if store.lookup_id(R::NATURAL_KEY, &key).await?.is_some() {
            return Ok(RowOutcome::SkippedExisting { key });
        }

        let reference = row.reference();
        let Some(reference_id) = store.lookup_id(R::REFERENCE, reference).await? else {
            return Ok(RowOutcome::MissingReference {
                key,
                lookup: R::REFERENCE,
                value: reference.to_string(),
            });
        };

        let record = match row.to_record(reference_id) {
            Ok(record) => record,
            Err(e) => {
                return Ok(RowOutcome::Invalid {
                    key: Some(key),
                    reason: e.to_string(),
                })
            }
        };

        let id = store.insert(&record).await?;
        Ok(RowOutcome::Imported { key, id })
    }
}

/// Roll back after a failed row and mark the report. A failing rollback is
/// logged; the connection discards the open transaction when it is released.
async fn abort<S: ImportStore>(
    mut report: ImportReport,
    store: S,
    line: u64,
    reason: String,
) -> ImportReport {
    error!(
        entity = report.entity,
        line,
        reason = %reason,
        "Rolling back import"
    );
    release(report.entity, store).await;
    report.status = ImportStatus::RolledBack { line, reason };
    report
}

async fn release<S: ImportStore>(entity: &str, store: S) {
    if let Err(e) = store.rollback().await {
        error!(entity, error = %e, "Rollback failed");
    }
}

fn log_outcome(entity: &str, line: u64, outcome: &RowOutcome) {
    match outcome {
        RowOutcome::Imported { key, id } => debug!(entity, line, key = %key, id, "Imported row"),
        RowOutcome::SkippedExisting { key } => {
            debug!(entity, line, key = %key, "Skipped existing row")
        }
        RowOutcome::MissingReference { key, lookup, value } => warn!(
            entity,
            line,
            key = %key,
            reference = lookup.entity(),
            value = %value,
            "Reference not found"
        ),
        RowOutcome::Invalid { reason, .. } => warn!(entity, line, reason = %reason, "Invalid row"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{RoomRepository, UserRepository};
    use crate::db::sqlite::SqliteRepository;
    use crate::db::DatabasePool;

    async fn setup() -> SqliteRepository {
        let pool = DatabasePool::new_sqlite_memory().await.unwrap();
        match pool {
            DatabasePool::Sqlite(p) => SqliteRepository::new(p),
        }
    }

    fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn rooms_csv(rows: &[&str]) -> String {
        let mut content = String::from("room_number,capacity,floor,building_address\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        content
    }

    #[tokio::test]
    async fn imports_user_with_resolved_role() {
        let repo = setup().await;
        let viewer = repo.create_role("viewer").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "users.csv",
            "name,email,role\nJan Novak,jan@example.com,viewer\n",
        );

        let session = repo.begin_import().await.unwrap();
        let report = Importer::default()
            .import_users(&path, session)
            .await
            .unwrap();

        assert!(report.is_committed());
        assert_eq!(report.imported(), 1);
        assert_eq!(report.rows[0].line, 2);

        let users = repo.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Jan Novak");
        assert_eq!(users[0].email, "jan@example.com");
        assert_eq!(users[0].role.as_deref(), Some("viewer"));

        let role_id: i64 = sqlx::query_scalar("SELECT role_id FROM users WHERE email = ?1")
            .bind("jan@example.com")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(role_id, viewer);
    }

    #[tokio::test]
    async fn second_run_skips_every_row() {
        let repo = setup().await;
        repo.create_role("viewer").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "users.csv",
            "name,email,role\nJan Novak,jan@example.com,viewer\n",
        );

        let importer = Importer::default();
        let first = importer
            .import_users(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();
        assert_eq!(first.imported(), 1);

        let second = importer
            .import_users(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();
        assert_eq!(second.imported(), 0);
        assert_eq!(second.skipped(), 1);
        assert!(second.rows[0].to_string().contains("jan@example.com"));
        assert!(second.rows[0].to_string().starts_with("skipped"));
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_role_is_reported_and_others_still_import() {
        let repo = setup().await;
        repo.create_role("viewer").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "users.csv",
            "name,email,role\n\
             Jan Novak,jan@example.com,superuser\n\
             Eva Mala,eva@example.com,viewer\n",
        );

        let report = Importer::default()
            .import_users(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert!(report.is_committed());
        assert_eq!(report.imported(), 1);
        assert_eq!(report.errors(), 1);
        assert_eq!(
            report.rows[0].outcome,
            RowOutcome::MissingReference {
                key: "jan@example.com".into(),
                lookup: Lookup::RoleByName,
                value: "superuser".into(),
            }
        );
        assert_eq!(
            report.rows[0].to_string(),
            "error: role 'superuser' not found for jan@example.com (line 2)"
        );
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn room_with_unknown_building_is_not_inserted() {
        let repo = setup().await;
        repo.create_building("Letná 9", "Košice").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "rooms.csv", &rooms_csv(&["B201,20,2,Nowhere 1"]));

        let report = Importer::default()
            .import_rooms(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert!(report.is_committed());
        assert_eq!(report.imported(), 0);
        assert!(matches!(
            report.rows[0].outcome,
            RowOutcome::MissingReference {
                lookup: Lookup::BuildingByAddress,
                ..
            }
        ));
        assert!(report.rows[0].to_string().contains("building 'Nowhere 1'"));
        assert_eq!(repo.count_rooms().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_capacity_rolls_back_whole_file_by_default() {
        let repo = setup().await;
        repo.create_building("Letná 9", "Košice").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "rooms.csv",
            &rooms_csv(&[
                "A101,10,1,Letná 9",
                "A102,12,1,Letná 9",
                "A103,15,1,Letná 9",
                "A104,8,1,Letná 9",
                "A105,lots,1,Letná 9",
                "A106,10,1,Letná 9",
                "A107,10,1,Letná 9",
                "A108,10,1,Letná 9",
                "A109,10,1,Letná 9",
                "A110,10,1,Letná 9",
            ]),
        );

        let report = Importer::default()
            .import_rooms(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert_eq!(
            report.status,
            ImportStatus::RolledBack {
                line: 6,
                reason: "invalid capacity 'lots': invalid digit found in string".into(),
            }
        );
        assert_eq!(report.rows.len(), 5);
        assert_eq!(report.imported(), 4);
        assert_eq!(repo.count_rooms().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn skip_policy_keeps_valid_rows() {
        let repo = setup().await;
        repo.create_building("Letná 9", "Košice").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "rooms.csv",
            &rooms_csv(&[
                "A101,10,1,Letná 9",
                "A102,ten,1,Letná 9",
                "A103,15,one,Letná 9",
                "A104,8,1,Letná 9",
            ]),
        );

        let report = Importer::new(RowFailurePolicy::Skip)
            .import_rooms(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert!(report.is_committed());
        assert_eq!(report.imported(), 2);
        assert_eq!(report.errors(), 2);
        assert_eq!(
            report.rows[2].to_string(),
            "error: A103 (line 4): invalid floor 'one': invalid digit found in string"
        );

        let rooms = repo.list_rooms().await.unwrap();
        let numbers: Vec<&str> = rooms.iter().map(|r| r.room_number.as_str()).collect();
        assert_eq!(numbers, vec!["A101", "A104"]);
    }

    #[tokio::test]
    async fn duplicate_key_within_file_is_skipped() {
        let repo = setup().await;
        repo.create_building("Letná 9", "Košice").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "rooms.csv",
            &rooms_csv(&["A101,10,1,Letná 9", "A101,99,3,Letná 9"]),
        );

        let report = Importer::default()
            .import_rooms(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert_eq!(report.imported(), 1);
        assert_eq!(report.skipped(), 1);
        let rooms = repo.list_rooms().await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].capacity, 10);
    }

    #[tokio::test]
    async fn existing_row_is_skipped_before_reference_check() {
        let repo = setup().await;
        let building = repo.create_building("Letná 9", "Košice").await.unwrap();
        repo.create_room(&NewRoom {
            room_number: "A101".into(),
            capacity: 10,
            floor: 1,
            building_id: building,
        })
        .await
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "rooms.csv", &rooms_csv(&["A101,10,1,Nowhere 1"]));

        let report = Importer::default()
            .import_rooms(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert_eq!(
            report.rows[0].outcome,
            RowOutcome::SkippedExisting { key: "A101".into() }
        );
    }

    #[tokio::test]
    async fn columns_are_matched_by_name() {
        let repo = setup().await;
        repo.create_building("Letná 9", "Košice").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "rooms.csv",
            "building_address,floor,room_number,capacity\nLetná 9,2,B201,30\n",
        );

        let report = Importer::default()
            .import_rooms(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert_eq!(report.imported(), 1);
        let rooms = repo.list_rooms().await.unwrap();
        assert_eq!(rooms[0].room_number, "B201");
        assert_eq!(rooms[0].capacity, 30);
        assert_eq!(rooms[0].floor, 2);
    }

    #[tokio::test]
    async fn missing_column_is_an_invalid_row() {
        let repo = setup().await;
        repo.create_role("viewer").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "users.csv",
            "name,email\nJan Novak,jan@example.com\n",
        );

        let report = Importer::new(RowFailurePolicy::Skip)
            .import_users(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert_eq!(report.errors(), 1);
        match &report.rows[0].outcome {
            RowOutcome::Invalid { key, reason } => {
                assert!(key.is_none());
                assert!(reason.contains("role"), "unexpected reason: {reason}");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert_eq!(repo.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn dry_run_reports_without_persisting() {
        let repo = setup().await;
        repo.create_role("viewer").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "users.csv",
            "name,email,role\nJan Novak,jan@example.com,viewer\nEva Mala,eva@example.com,viewer\n",
        );

        let report = Importer::default()
            .dry_run(true)
            .import_users(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert_eq!(report.status, ImportStatus::DryRun);
        assert_eq!(report.imported(), 2);
        assert_eq!(repo.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let repo = setup().await;
        let dir = tempfile::tempdir().unwrap();

        let result = Importer::default()
            .import_users(&dir.path().join("absent.csv"), repo.begin_import().await.unwrap())
            .await;

        assert!(result.is_err());
        // The session was released, so the pool is still usable.
        assert_eq!(repo.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn header_only_file_commits_nothing() {
        let repo = setup().await;
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "rooms.csv", &rooms_csv(&[]));

        let report = Importer::default()
            .import_rooms(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert!(report.is_committed());
        assert!(report.rows.is_empty());
    }

    #[tokio::test]
    async fn malformed_record_line_counts_multiline_fields() {
        let repo = setup().await;
        repo.create_role("viewer").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "users.csv",
            "name,email,role\n\"Jan\nNovak\",jan@example.com,viewer\nEva Mala,eva@example.com,viewer\nbroken,row\n",
        );

        let report = Importer::default()
            .import_users(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        assert_eq!(report.rows[0].line, 2);
        assert_eq!(report.rows[1].line, 4);
        assert_eq!(report.rows[2].line, 5);
        match &report.status {
            ImportStatus::RolledBack { line, reason } => {
                assert_eq!(*line, 5);
                assert!(reason.starts_with("malformed record"), "unexpected reason: {reason}");
            }
            other => panic!("expected RolledBack, got {other:?}"),
        }
        assert!(report.rows[2].to_string().starts_with("error: line 5:"));
        assert_eq!(repo.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn database_failure_rolls_back_under_skip_policy() {
        let repo = setup().await;
        repo.create_building("Letná 9", "Košice").await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_a3 BEFORE INSERT ON rooms
             WHEN NEW.room_number = 'A3'
             BEGIN SELECT RAISE(ABORT, 'room A3 is locked'); END",
        )
        .execute(repo.pool())
        .await
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "rooms.csv",
            &rooms_csv(&["A1,10,1,Letná 9", "A2,10,1,Letná 9", "A3,10,1,Letná 9", "A4,10,1,Letná 9"]),
        );

        let report = Importer::new(RowFailurePolicy::Skip)
            .import_rooms(&path, repo.begin_import().await.unwrap())
            .await
            .unwrap();

        match &report.status {
            ImportStatus::RolledBack { line, reason } => {
                assert_eq!(*line, 4);
                assert!(reason.contains("room A3 is locked"), "unexpected reason: {reason}");
                assert_eq!(reason.matches("database error").count(), 1);
            }
            other => panic!("expected RolledBack, got {other:?}"),
        }
        assert_eq!(report.rows.len(), 2);
        assert_eq!(repo.count_rooms().await.unwrap(), 0);
    }

    /// Store whose rollback always fails, to check which error wins.
    struct BrokenRollback;

    #[async_trait::async_trait]
    impl ImportStore for BrokenRollback {
        async fn lookup_id(&mut self, lookup: Lookup, _value: &str) -> Result<Option<i64>> {
            // Every reference resolves, no natural key exists yet.
            Ok(match lookup {
                Lookup::RoleByName | Lookup::BuildingByAddress => Some(1),
                Lookup::UserByEmail | Lookup::RoomByNumber => None,
            })
        }

        async fn commit(self) -> Result<()> {
            Ok(())
        }

        async fn rollback(self) -> Result<()> {
            Err(crate::error::BmrError::Config("connection lost".into()))
        }
    }

    #[async_trait::async_trait]
    impl Insert<NewRoom> for BrokenRollback {
        async fn insert(&mut self, _room: &NewRoom) -> Result<i64> {
            Ok(1)
        }
    }

    #[tokio::test]
    async fn open_failure_keeps_original_error_when_rollback_fails() {
        let dir = tempfile::tempdir().unwrap();

        let err = Importer::default()
            .import_rooms(&dir.path().join("absent.csv"), BrokenRollback)
            .await
            .unwrap_err();

        assert!(matches!(err, crate::error::BmrError::Io(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn failed_rollback_still_reports_rolled_back_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "rooms.csv", &rooms_csv(&["A1,many,1,Letná 9"]));

        let report = Importer::default()
            .import_rooms(&path, BrokenRollback)
            .await
            .unwrap();

        assert!(matches!(report.status, ImportStatus::RolledBack { line: 2, .. }));
    }

    #[test]
    fn row_report_display() {
        let imported = RowReport {
            line: 2,
            outcome: RowOutcome::Imported {
                key: "A103".into(),
                id: 1,
            },
        };
        assert_eq!(imported.to_string(), "imported: A103");

        let malformed = RowReport {
            line: 9,
            outcome: RowOutcome::Invalid {
                key: None,
                reason: "malformed record: unequal lengths".into(),
            },
        };
        assert_eq!(
            malformed.to_string(),
            "error: line 9: malformed record: unequal lengths"
        );
    }
}
