use serde::{Deserialize, Serialize};

/// A building; its address is the natural key rooms refer to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Building {
    pub id: i64,
    pub address: String,
    pub city: String,
}
