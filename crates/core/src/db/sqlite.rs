use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::error::{BmrError, Result};
use crate::models::{
    building::Building,
    reservation::ReservationRecord,
    room::{NewRoom, RoomRecord},
    user::{NewUser, UserRecord},
};

use super::repository::{
    BookingRepository, BuildingRepository, ImportStore, Insert, Lookup, ReservationRepository,
    RoomRepository, UserRepository,
};

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a transaction for importing one file.
    pub async fn begin_import(&self) -> Result<SqliteImportSession> {
        let tx = self.pool.begin().await?;
        Ok(SqliteImportSession { tx })
    }
}

impl BookingRepository for SqliteRepository {}

// -- Helper functions for the TEXT date/time columns --

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| BmrError::Serialization(format!("invalid stored date '{s}': {e}")))
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|e| BmrError::Serialization(format!("invalid stored time '{s}': {e}")))
}

// -- Buildings --

#[async_trait]
impl BuildingRepository for SqliteRepository {
    async fn list_buildings(&self) -> Result<Vec<Building>> {
        let rows =
            sqlx::query("SELECT building_id, address, city FROM buildings ORDER BY building_id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .iter()
            .map(|r| Building {
                id: r.get("building_id"),
                address: r.get("address"),
                city: r.get("city"),
            })
            .collect())
    }
}

// -- Users --

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query(
            "SELECT u.user_id, u.name, u.email, r.name AS role
             FROM users u
             LEFT JOIN roles r ON u.role_id = r.role_id
             ORDER BY u.user_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| UserRecord {
                id: r.get("user_id"),
                name: r.get("name"),
                email: r.get("email"),
                role: r.get("role"),
            })
            .collect())
    }
}

// -- Rooms --

#[async_trait]
impl RoomRepository for SqliteRepository {
    async fn list_rooms(&self) -> Result<Vec<RoomRecord>> {
        let rows = sqlx::query(
            "SELECT m.room_id, m.room_number, m.capacity, m.floor, b.address AS building_address
             FROM rooms m
             JOIN buildings b ON m.building_id = b.building_id
             ORDER BY m.room_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| RoomRecord {
                id: r.get("room_id"),
                room_number: r.get("room_number"),
                capacity: r.get("capacity"),
                floor: r.get("floor"),
                building_address: r.get("building_address"),
            })
            .collect())
    }
}

// -- Reservations --

#[async_trait]
impl ReservationRepository for SqliteRepository {
    async fn list_reservations(&self) -> Result<Vec<ReservationRecord>> {
        let rows = sqlx::query(
            "SELECT r.reservation_id, m.room_number, u.email AS user_email,
                    r.reservation_date, r.start_time, r.duration_minutes, r.created_date
             FROM reservations r
             JOIN rooms m ON r.room_id = m.room_id
             JOIN users u ON r.user_id = u.user_id
             ORDER BY r.reservation_date, r.start_time, r.reservation_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut reservations = Vec::with_capacity(rows.len());
        for r in &rows {
            reservations.push(ReservationRecord {
                id: r.get("reservation_id"),
                room_number: r.get("room_number"),
                user_email: r.get("user_email"),
                date: parse_date(r.get("reservation_date"))?,
                start_time: parse_time(r.get("start_time"))?,
                duration_minutes: r.get("duration_minutes"),
                created: parse_date(r.get("created_date"))?,
            });
        }
        Ok(reservations)
    }
}

// -- Test fixtures --

/// Direct inserts for seeding test databases. Production writes only happen
/// through [`SqliteImportSession`].
#[cfg(test)]
impl SqliteRepository {
    pub async fn create_role(&self, name: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO roles (name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn create_building(&self, address: &str, city: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO buildings (address, city) VALUES (?1, ?2)")
            .bind(address)
            .bind(city)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<i64> {
        let result = sqlx::query("INSERT INTO users (name, email, role_id) VALUES (?1, ?2, ?3)")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role_id)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn create_room(&self, room: &NewRoom) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO rooms (room_number, capacity, floor, building_id) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&room.room_number)
        .bind(room.capacity)
        .bind(room.floor)
        .bind(room.building_id)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn create_reservation(
        &self,
        reservation: &crate::models::reservation::NewReservation,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO reservations (room_id, user_id, reservation_date, start_time, duration_minutes, created_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(reservation.room_id)
        .bind(reservation.user_id)
        .bind(reservation.date.format(DATE_FORMAT).to_string())
        .bind(reservation.start_time.format(TIME_FORMAT).to_string())
        .bind(reservation.duration_minutes)
        .bind(reservation.created.format(DATE_FORMAT).to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_rooms(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// -- Import session --

/// One import transaction. Dropping the session without committing rolls it back.
pub struct SqliteImportSession {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl ImportStore for SqliteImportSession {
    async fn lookup_id(&mut self, lookup: Lookup, value: &str) -> Result<Option<i64>> {
        let sql = match lookup {
            Lookup::UserByEmail => "SELECT user_id FROM users WHERE email = ?1",
            Lookup::RoleByName => "SELECT role_id FROM roles WHERE name = ?1",
            Lookup::RoomByNumber => "SELECT room_id FROM rooms WHERE room_number = ?1",
            Lookup::BuildingByAddress => "SELECT building_id FROM buildings WHERE address = ?1",
        };

        let id: Option<i64> = sqlx::query_scalar(sql)
            .bind(value)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(id)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl Insert<NewUser> for SqliteImportSession {
    async fn insert(&mut self, user: &NewUser) -> Result<i64> {
        let result = sqlx::query("INSERT INTO users (name, email, role_id) VALUES (?1, ?2, ?3)")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.last_insert_rowid())
    }
}

#[async_trait]
impl Insert<NewRoom> for SqliteImportSession {
    async fn insert(&mut self, room: &NewRoom) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO rooms (room_number, capacity, floor, building_id) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&room.room_number)
        .bind(room.capacity)
        .bind(room.floor)
        .bind(room.building_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.last_insert_rowid())
    }
}
