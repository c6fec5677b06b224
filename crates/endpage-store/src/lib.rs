//! Flat-file record store: one CSV file per entity type, fixed header row,
//! full-file rewrite on every mutation.
//!
//! The format has no in-place row addressing, so updates and deletes are a
//! full read-modify-write of the dataset. Each table serializes its
//! mutations on a `tokio::sync::Mutex` so concurrent requests cannot lose
//! interleaved updates. Datasets are assumed small; every lookup is a
//! linear scan.

pub mod codec;
pub mod pages;
pub mod users;

use std::marker::PhantomData;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

pub use pages::PageStore;
pub use users::UserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed field: {0}")]
    Field(String),
}

/// Binds a domain type to its flat CSV row form.
pub trait Record: Clone + Send + Sync + 'static {
    type Row: Serialize + DeserializeOwned + Send;

    /// Column names in on-disk order. Must match the serde field names of
    /// `Row` after renaming.
    const HEADER: &'static [&'static str];

    fn id(&self) -> Uuid;
    fn to_row(&self) -> Self::Row;
    fn from_row(row: Self::Row) -> Result<Self, StoreError>;
}

/// A single CSV file holding a homogeneous collection of records.
///
/// Reads never take the lock: each one re-reads the whole file and a
/// rewrite replaces the file atomically via rename, so a concurrent reader
/// sees either the old or the new dataset, never a torn one.
pub struct CsvTable<R: Record> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<R>,
}

impl<R: Record> CsvTable<R> {
    /// Open a table, creating the parent directory and a header-only file
    /// when the file is absent or empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let table = Self {
            path,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        };
        table.repair_header().await?;
        info!("CSV table ready at {}", table.path.display());
        Ok(table)
    }

    /// Full ordered decode of every row on disk. An absent or empty file
    /// reads as zero records and is repaired to header-only.
    pub async fn read_all(&self) -> Result<Vec<R>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.repair_header().await?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            self.repair_header().await?;
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut records = Vec::new();
        for row in reader.deserialize::<R::Row>() {
            records.push(R::from_row(row?)?);
        }
        Ok(records)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        Ok(self.read_all().await?.into_iter().find(|r| r.id() == id))
    }

    /// Encode one row and append it without reading existing data.
    pub async fn append(&self, record: &R) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.append_unlocked(record).await
    }

    /// Append guarded by a predicate over the current dataset, all within
    /// one critical section. Used by creation paths that must enforce
    /// uniqueness against concurrent writers.
    pub async fn append_if<F>(&self, record: &R, check: F) -> Result<(), StoreError>
    where
        F: FnOnce(&[R]) -> Result<(), StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let existing = self.read_all().await?;
        check(&existing)?;
        self.append_unlocked(record).await
    }

    /// Replace the entire file content with the header followed by `records`.
    pub async fn write_all(&self, records: &[R]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_all_unlocked(records).await
    }

    /// Full read, in-memory transform, full write as one critical section.
    /// When `f` fails the file is left untouched.
    pub async fn mutate<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<R>) -> Result<T, StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;
        let out = f(&mut records)?;
        self.write_all_unlocked(&records).await?;
        Ok(out)
    }

    async fn repair_header(&self) -> Result<(), StoreError> {
        let empty = match fs::metadata(&self.path).await {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if empty {
            fs::write(&self.path, header_line::<R>()?).await?;
        }
        Ok(())
    }

    async fn append_unlocked(&self, record: &R) -> Result<(), StoreError> {
        self.repair_header().await?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.serialize(record.to_row())?;
        let row = into_bytes(writer)?;

        let mut file = fs::OpenOptions::new().append(true).open(&self.path).await?;
        file.write_all(&row).await?;
        file.flush().await?;
        Ok(())
    }

    async fn write_all_unlocked(&self, records: &[R]) -> Result<(), StoreError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(R::HEADER)?;
        for record in records {
            writer.serialize(record.to_row())?;
        }
        let bytes = into_bytes(writer)?;

        // Whole-file replace via temp + rename; readers never observe a
        // half-written file and a failed write leaves the old data intact.
        let tmp = self.path.with_extension("csv.tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn header_line<R: Record>() -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(R::HEADER)?;
    into_bytes(writer)
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, StoreError> {
    writer
        .into_inner()
        .map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))
}
