//! Page records over `pages.csv`, including the like/unlike mutations.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use endpage_types::models::Page;

use crate::{CsvTable, Record, StoreError, codec};

/// On-disk row form. List fields are `;`-joined, the custom theme is a
/// JSON object in a single cell; serde names match the header columns.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRow {
    pub id: Uuid,
    pub creator_name: String,
    pub creator_id: Uuid,
    pub reason_of_leaving: String,
    pub theme_name: String,
    pub custom_theme: String,
    pub creator_message: String,
    pub images: String,
    pub gifs: String,
    pub videos: String,
    pub liked_by: String,
    pub created_at: DateTime<Utc>,
}

impl Record for Page {
    type Row = PageRow;

    const HEADER: &'static [&'static str] = &[
        "id",
        "creatorName",
        "creatorId",
        "reasonOfLeaving",
        "themeName",
        "customTheme",
        "creatorMessage",
        "images",
        "gifs",
        "videos",
        "likedBy",
        "createdAt",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn to_row(&self) -> PageRow {
        PageRow {
            id: self.id,
            creator_name: self.creator_name.clone(),
            creator_id: self.creator_id,
            reason_of_leaving: self.reason_of_leaving.clone(),
            theme_name: self.theme_name.clone(),
            custom_theme: codec::encode_theme(self.custom_theme.as_ref()),
            creator_message: self.creator_message.clone(),
            images: codec::join(&self.images),
            gifs: codec::join(&self.gifs),
            videos: codec::join(&self.videos),
            liked_by: codec::join_ids(&self.liked_by),
            created_at: self.created_at,
        }
    }

    fn from_row(row: PageRow) -> Result<Self, StoreError> {
        Ok(Page {
            id: row.id,
            creator_name: row.creator_name,
            creator_id: row.creator_id,
            reason_of_leaving: row.reason_of_leaving,
            theme_name: row.theme_name,
            custom_theme: codec::decode_theme(&row.custom_theme)?,
            creator_message: row.creator_message,
            images: codec::split(&row.images),
            gifs: codec::split(&row.gifs),
            videos: codec::split(&row.videos),
            liked_by: codec::split_ids(&row.liked_by)?,
            created_at: row.created_at,
        })
    }
}

pub struct PageStore {
    table: CsvTable<Page>,
}

impl PageStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            table: CsvTable::open(path).await?,
        })
    }

    pub async fn list(&self) -> Result<Vec<Page>, StoreError> {
        self.table.read_all().await
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Page>, StoreError> {
        self.table.find(id).await
    }

    /// Ids are generated by the caller; creation appends without reading
    /// existing data.
    pub async fn insert(&self, page: Page) -> Result<Page, StoreError> {
        self.table.append(&page).await?;
        Ok(page)
    }

    pub async fn update<F>(&self, id: Uuid, f: F) -> Result<Page, StoreError>
    where
        F: FnOnce(&mut Page),
    {
        self.table
            .mutate(|pages| {
                let page = pages
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or(StoreError::NotFound)?;
                f(page);
                Ok(page.clone())
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.table
            .mutate(|pages| {
                let before = pages.len();
                pages.retain(|p| p.id != id);
                if pages.len() == before {
                    Err(StoreError::NotFound)
                } else {
                    Ok(())
                }
            })
            .await
    }

    /// Add `user_id` to the liker set. The set never gains a duplicate: a
    /// second like from the same user is a conflict and leaves the file
    /// untouched.
    pub async fn add_like(&self, page_id: Uuid, user_id: Uuid) -> Result<Page, StoreError> {
        self.table
            .mutate(|pages| {
                let page = pages
                    .iter_mut()
                    .find(|p| p.id == page_id)
                    .ok_or(StoreError::NotFound)?;
                if page.liked_by.contains(&user_id) {
                    return Err(StoreError::Conflict);
                }
                page.liked_by.push(user_id);
                Ok(page.clone())
            })
            .await
    }

    /// Symmetric removal; unliking a page the user never liked is a
    /// conflict.
    pub async fn remove_like(&self, page_id: Uuid, user_id: Uuid) -> Result<Page, StoreError> {
        self.table
            .mutate(|pages| {
                let page = pages
                    .iter_mut()
                    .find(|p| p.id == page_id)
                    .ok_or(StoreError::NotFound)?;
                let before = page.liked_by.len();
                page.liked_by.retain(|u| *u != user_id);
                if page.liked_by.len() == before {
                    return Err(StoreError::Conflict);
                }
                Ok(page.clone())
            })
            .await
    }

    /// Top `n` pages by like count; ties keep insertion order.
    pub async fn top_liked(&self, n: usize) -> Result<Vec<Page>, StoreError> {
        let mut pages = self.list().await?;
        pages.sort_by(|a, b| b.liked_by.len().cmp(&a.liked_by.len()));
        pages.truncate(n);
        Ok(pages)
    }
}
