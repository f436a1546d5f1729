use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A reservation joined with its room number and the booking user's email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationRecord {
    pub id: i64,
    pub room_number: String,
    pub user_email: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub created: NaiveDate,
}

/// A reservation row to insert. The CSV tools only read reservations, so
/// this is used to seed test databases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewReservation {
    pub room_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub created: NaiveDate,
}
