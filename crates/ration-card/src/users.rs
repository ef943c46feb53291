//! Read-only view over identity records owned by the auth subsystem.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier issued by the auth subsystem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub role: Role,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Phone number usable for SMS delivery, if one was registered.
    pub fn contact_number(&self) -> Option<&str> {
        let phone = self.phone.trim();
        (!phone.is_empty()).then_some(phone)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

/// Lookup port for user records.
pub trait UserDirectory: Send + Sync {
    fn find(&self, id: &UserId) -> Result<Option<User>, DirectoryError>;

    /// Users with the `user` role, offered to administrators as distribution recipients.
    fn list_citizens(&self) -> Result<Vec<User>, DirectoryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<BTreeMap<UserId, User>>,
}

impl InMemoryUserDirectory {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    /// Registers or replaces a user record.
    pub fn upsert(&self, user: User) -> Result<(), DirectoryError> {
        let mut guard = self
            .users
            .write()
            .map_err(|_| DirectoryError::Unavailable("directory lock poisoned".to_string()))?;
        guard.insert(user.id.clone(), user);
        Ok(())
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find(&self, id: &UserId) -> Result<Option<User>, DirectoryError> {
        let guard = self
            .users
            .read()
            .map_err(|_| DirectoryError::Unavailable("directory lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    fn list_citizens(&self) -> Result<Vec<User>, DirectoryError> {
        let guard = self
            .users
            .read()
            .map_err(|_| DirectoryError::Unavailable("directory lock poisoned".to_string()))?;
        Ok(guard
            .values()
            .filter(|user| user.role == Role::User)
            .cloned()
            .collect())
    }
}
