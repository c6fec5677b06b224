//! User records over `users.csv`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use endpage_types::models::User;

use crate::{CsvTable, Record, StoreError};

/// On-disk row form; serde names match the camelCase header columns.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl Record for User {
    type Row = UserRow;

    const HEADER: &'static [&'static str] = &["id", "username", "password", "createdAt"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn to_row(&self) -> UserRow {
        UserRow {
            id: self.id,
            username: self.username.clone(),
            password: self.password.clone(),
            created_at: self.created_at,
        }
    }

    fn from_row(row: UserRow) -> Result<Self, StoreError> {
        Ok(User {
            id: row.id,
            username: row.username,
            password: row.password,
            created_at: row.created_at,
        })
    }
}

pub struct UserStore {
    table: CsvTable<User>,
}

impl UserStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            table: CsvTable::open(path).await?,
        })
    }

    pub async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.table.read_all().await
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.table.find(id).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .table
            .read_all()
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }

    /// Insert a new account. Username uniqueness (case-sensitive) is checked
    /// against the current dataset inside the same critical section as the
    /// append, so two concurrent registrations cannot both win.
    pub async fn insert(&self, user: User) -> Result<User, StoreError> {
        self.table
            .append_if(&user, |existing| {
                if existing.iter().any(|u| u.username == user.username) {
                    Err(StoreError::Conflict)
                } else {
                    Ok(())
                }
            })
            .await?;
        Ok(user)
    }

    /// Change username and/or password hash. A username already held by a
    /// different account is a conflict.
    pub async fn update_profile(
        &self,
        id: Uuid,
        username: Option<String>,
        password_hash: Option<String>,
    ) -> Result<User, StoreError> {
        self.table
            .mutate(|users| {
                if let Some(name) = &username {
                    if users.iter().any(|u| u.username == *name && u.id != id) {
                        return Err(StoreError::Conflict);
                    }
                }
                let user = users
                    .iter_mut()
                    .find(|u| u.id == id)
                    .ok_or(StoreError::NotFound)?;
                if let Some(name) = username {
                    user.username = name;
                }
                if let Some(hash) = password_hash {
                    user.password = hash;
                }
                Ok(user.clone())
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.table
            .mutate(|users| {
                let before = users.len();
                users.retain(|u| u.id != id);
                if users.len() == before {
                    Err(StoreError::NotFound)
                } else {
                    Ok(())
                }
            })
            .await
    }
}
