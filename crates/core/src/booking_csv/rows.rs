//! CSV row structs for the four exported tables.
//!
//! Every field is kept as text so that a malformed value surfaces as a
//! per-row error at conversion time instead of failing the whole file.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{BmrError, Result};
use crate::models::{
    building::Building,
    reservation::ReservationRecord,
    room::{NewRoom, RoomRecord},
    user::{NewUser, UserRecord},
};

/// A CSV row type with a fixed header.
pub trait CsvTable: Serialize {
    /// Column names, in file order. Must match the serialized field order.
    const HEADER: &'static [&'static str];

    /// Short description used for progress output.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_int(field: &'static str, value: &str) -> Result<i64> {
    value.parse::<i64>().map_err(|e| BmrError::InvalidField {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn date_to_csv(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn time_to_csv(t: &NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

fn minutes_to_csv(minutes: i64) -> String {
    format!("{:02}:{:02}:00", minutes / 60, minutes % 60)
}

// ---------------------------------------------------------------------------
// UserCsvRow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCsvRow {
    pub name: String,
    pub email: String,
    pub role: String,
}

impl UserCsvRow {
    pub fn from_model(user: &UserRecord) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone().unwrap_or_default(),
        }
    }

    pub fn to_new_user(&self, role_id: i64) -> NewUser {
        NewUser {
            name: self.name.clone(),
            email: self.email.clone(),
            role_id,
        }
    }
}

impl CsvTable for UserCsvRow {
    const HEADER: &'static [&'static str] = &["name", "email", "role"];

    fn describe(&self) -> String {
        format!("{} ({})", self.name, self.email)
    }
}

// ---------------------------------------------------------------------------
// RoomCsvRow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCsvRow {
    pub room_number: String,
    pub capacity: String,
    pub floor: String,
    pub building_address: String,
}

impl RoomCsvRow {
    pub fn from_model(room: &RoomRecord) -> Self {
        Self {
            room_number: room.room_number.clone(),
            capacity: room.capacity.to_string(),
            floor: room.floor.to_string(),
            building_address: room.building_address.clone(),
        }
    }

    /// Convert to an insertable room, parsing capacity and floor.
    pub fn to_new_room(&self, building_id: i64) -> Result<NewRoom> {
        Ok(NewRoom {
            room_number: self.room_number.clone(),
            capacity: parse_int("capacity", &self.capacity)?,
            floor: parse_int("floor", &self.floor)?,
            building_id,
        })
    }
}

impl CsvTable for RoomCsvRow {
    const HEADER: &'static [&'static str] =
        &["room_number", "capacity", "floor", "building_address"];

    fn describe(&self) -> String {
        format!("{} (capacity {})", self.room_number, self.capacity)
    }
}

// ---------------------------------------------------------------------------
// BuildingCsvRow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingCsvRow {
    pub address: String,
    pub city: String,
}

impl BuildingCsvRow {
    pub fn from_model(building: &Building) -> Self {
        Self {
            address: building.address.clone(),
            city: building.city.clone(),
        }
    }
}

impl CsvTable for BuildingCsvRow {
    const HEADER: &'static [&'static str] = &["address", "city"];

    fn describe(&self) -> String {
        format!("{}, {}", self.address, self.city)
    }
}

// ---------------------------------------------------------------------------
// ReservationCsvRow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCsvRow {
    pub room_number: String,
    pub user_email: String,
    pub date: String,
    pub start_time: String,
    pub duration: String,
    pub created: String,
}

impl ReservationCsvRow {
    pub fn from_model(reservation: &ReservationRecord) -> Self {
        Self {
            room_number: reservation.room_number.clone(),
            user_email: reservation.user_email.clone(),
            date: date_to_csv(&reservation.date),
            start_time: time_to_csv(&reservation.start_time),
            duration: minutes_to_csv(reservation.duration_minutes),
            created: date_to_csv(&reservation.created),
        }
    }
}

impl CsvTable for ReservationCsvRow {
    const HEADER: &'static [&'static str] = &[
        "room_number",
        "user_email",
        "date",
        "start_time",
        "duration",
        "created",
    ];

    fn describe(&self) -> String {
        format!("{} - {} ({})", self.room_number, self.user_email, self.date)
    }
}
