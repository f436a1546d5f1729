use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    building::Building, reservation::ReservationRecord, room::RoomRecord, user::UserRecord,
};

#[async_trait]
pub trait BuildingRepository: Send + Sync {
    /// All buildings, ordered by surrogate id.
    async fn list_buildings(&self) -> Result<Vec<Building>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users left-joined to their role, ordered by surrogate id.
    async fn list_users(&self) -> Result<Vec<UserRecord>>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Rooms inner-joined to their building, ordered by surrogate id.
    async fn list_rooms(&self) -> Result<Vec<RoomRecord>>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Reservations joined to room and user, ordered by date then start time.
    async fn list_reservations(&self) -> Result<Vec<ReservationRecord>>;
}

/// Read side used by the exporter. Writes go through an [`ImportStore`].
pub trait BookingRepository:
    BuildingRepository + UserRepository + RoomRepository + ReservationRepository
{
}

/// Natural-key lookups the importer runs inside its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    UserByEmail,
    RoleByName,
    RoomByNumber,
    BuildingByAddress,
}

impl Lookup {
    /// Human-readable name of the entity being looked up.
    pub fn entity(&self) -> &'static str {
        match self {
            Lookup::UserByEmail => "user",
            Lookup::RoleByName => "role",
            Lookup::RoomByNumber => "room",
            Lookup::BuildingByAddress => "building",
        }
    }
}

/// A transactional session the importer reads from and writes to.
///
/// Every lookup and insert of one file goes through the same session, so
/// lookups see the file's own uncommitted inserts.
#[async_trait]
pub trait ImportStore: Send {
    /// Surrogate id of the row matching `value`, if any.
    async fn lookup_id(&mut self, lookup: Lookup, value: &str) -> Result<Option<i64>>;
    async fn commit(self) -> Result<()>;
    async fn rollback(self) -> Result<()>;
}

/// Insertion of one resolved record type into an [`ImportStore`].
#[async_trait]
pub trait Insert<T: Sync>: ImportStore {
    /// Insert the record and return its new surrogate id.
    async fn insert(&mut self, record: &T) -> Result<i64>;
}
