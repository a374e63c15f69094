use serde::{Deserialize, Serialize};

/// The protected record: one row whose `version` advances by exactly one
/// per committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pg", derive(sqlx::FromRow))]
pub struct Profile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub version: i64,
}

impl Profile {
    /// A record as it looks before its first insert. The store assigns the
    /// initial version on create.
    pub fn new<E, F, L>(email: E, first_name: F, last_name: L) -> Self
    where
        E: Into<String>,
        F: Into<String>,
        L: Into<String>,
    {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            version: 0,
        }
    }
}
