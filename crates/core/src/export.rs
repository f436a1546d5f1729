//! Table exports.
//!
//! Each target is read in full from the repository first and only then
//! written, so a database error never leaves a partial file behind.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, error, info};

use crate::booking_csv::rows::{BuildingCsvRow, ReservationCsvRow, RoomCsvRow, UserCsvRow};
use crate::booking_csv::{write_table, CsvTable};
use crate::db::repository::{
    BookingRepository, BuildingRepository, ReservationRepository, RoomRepository, UserRepository,
};
use crate::error::Result;

/// A table that can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Users,
    Rooms,
    Buildings,
    Reservations,
}

impl ExportTarget {
    /// Export-all order.
    pub const ALL: [ExportTarget; 4] = [
        ExportTarget::Buildings,
        ExportTarget::Rooms,
        ExportTarget::Users,
        ExportTarget::Reservations,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExportTarget::Users => "users",
            ExportTarget::Rooms => "rooms",
            ExportTarget::Buildings => "buildings",
            ExportTarget::Reservations => "reservations",
        }
    }

    /// `users_export.csv` without a timestamp, `users_20250301_083000.csv` with one.
    pub fn file_name(&self, timestamp: Option<&NaiveDateTime>) -> String {
        match timestamp {
            Some(ts) => format!("{}_{}.csv", self.name(), ts.format("%Y%m%d_%H%M%S")),
            None => format!("{}_export.csv", self.name()),
        }
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of exporting one table.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub target: ExportTarget,
    pub path: PathBuf,
    /// One description per exported record, in file order.
    pub progress: Vec<String>,
}

impl ExportSummary {
    pub fn rows(&self) -> usize {
        self.progress.len()
    }
}

pub struct Exporter<'a, R: BookingRepository> {
    repo: &'a R,
}

impl<'a, R: BookingRepository> Exporter<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Export one table to `path`, replacing any existing file.
    pub async fn export(&self, target: ExportTarget, path: &Path) -> Result<ExportSummary> {
        info!(entity = target.name(), path = %path.display(), "Exporting");

        let progress = match target {
            ExportTarget::Users => {
                let rows: Vec<UserCsvRow> = self
                    .repo
                    .list_users()
                    .await?
                    .iter()
                    .map(UserCsvRow::from_model)
                    .collect();
                write_rows(path, &rows)?
            }
            ExportTarget::Rooms => {
                let rows: Vec<RoomCsvRow> = self
                    .repo
                    .list_rooms()
                    .await?
                    .iter()
                    .map(RoomCsvRow::from_model)
                    .collect();
                write_rows(path, &rows)?
            }
            ExportTarget::Buildings => {
                let rows: Vec<BuildingCsvRow> = self
                    .repo
                    .list_buildings()
                    .await?
                    .iter()
                    .map(BuildingCsvRow::from_model)
                    .collect();
                write_rows(path, &rows)?
            }
            ExportTarget::Reservations => {
                let rows: Vec<ReservationCsvRow> = self
                    .repo
                    .list_reservations()
                    .await?
                    .iter()
                    .map(ReservationCsvRow::from_model)
                    .collect();
                write_rows(path, &rows)?
            }
        };

        info!(entity = target.name(), rows = progress.len(), "Export finished");

        Ok(ExportSummary {
            target,
            path: path.to_path_buf(),
            progress,
        })
    }

    /// Export every table into `dir`, all files sharing `timestamp`.
    ///
    /// A failed table is reported in its slot and the remaining tables are
    /// still exported.
    pub async fn export_all(
        &self,
        dir: &Path,
        timestamp: &NaiveDateTime,
    ) -> Vec<(ExportTarget, Result<ExportSummary>)> {
        let mut results = Vec::with_capacity(ExportTarget::ALL.len());
        for target in ExportTarget::ALL {
            let path = dir.join(target.file_name(Some(timestamp)));
            let result = self.export(target, &path).await;
            if let Err(e) = &result {
                error!(entity = target.name(), error = %e, "Export failed");
            }
            results.push((target, result));
        }
        results
    }
}

fn write_rows<T: CsvTable>(path: &Path, rows: &[T]) -> Result<Vec<String>> {
    write_table(path, rows)?;
    Ok(rows
        .iter()
        .map(|row| {
            let line = row.describe();
            debug!(row = %line, "Exported row");
            line
        })
        .collect())
}
