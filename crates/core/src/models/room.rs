use serde::{Deserialize, Serialize};

/// A room as read back for export, with its building resolved to an address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomRecord {
    pub id: i64,
    pub room_number: String,
    pub capacity: i64,
    pub floor: i64,
    pub building_address: String,
}

/// A room ready to be inserted, with its building already resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewRoom {
    pub room_number: String,
    pub capacity: i64,
    pub floor: i64,
    pub building_id: i64,
}
