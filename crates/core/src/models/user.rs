use serde::{Deserialize, Serialize};

/// A user as read back for export, with the role resolved to its name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// `None` when the user has no role or the role row is gone.
    pub role: Option<String>,
}

/// A user ready to be inserted, with its role already resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role_id: i64,
}
