use crate::entities::{file_records, prelude::*};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    sea_query::{Expr, Func},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("title already in use: {0}")]
    DuplicateTitle(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Fields supplied when a record is created; `created_at` is stamped on insert.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub id: String,
    pub title: String,
    pub filename: String,
    pub file_path: String,
    pub secret_code: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub is_folder: bool,
    pub file_count: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Matched anywhere in the title, ignoring ASCII case on every backend
    pub title_contains: Option<String>,
    pub limit: Option<u64>,
}

/// Record store collaborator over the `file_records` table.
#[derive(Clone)]
pub struct RecordStore {
    db: DatabaseConnection,
}

impl RecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Inserts a record. A UNIQUE violation on `title` becomes `DuplicateTitle`,
    /// which covers two uploads racing past the pre-insert check.
    pub async fn insert(&self, record: NewRecord) -> Result<file_records::Model, RecordError> {
        let title = record.title.clone();
        let active = file_records::ActiveModel {
            id: Set(record.id),
            title: Set(record.title),
            filename: Set(record.filename),
            file_path: Set(record.file_path),
            secret_code: Set(record.secret_code),
            content_type: Set(record.content_type),
            size: Set(record.size),
            is_folder: Set(record.is_folder),
            file_count: Set(record.file_count),
            is_verified: Set(Some(false)),
            created_at: Set(Utc::now()),
        };

        active.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => RecordError::DuplicateTitle(title),
            _ => RecordError::Database(e),
        })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<file_records::Model, RecordError> {
        FileRecords::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RecordError::NotFound(id.to_string()))
    }

    pub async fn title_exists(&self, title: &str) -> Result<bool, RecordError> {
        let count = FileRecords::find()
            .filter(file_records::Column::Title.eq(title))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Filtered listing, newest first.
    pub async fn select_where(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<file_records::Model>, RecordError> {
        let mut query = FileRecords::find();

        if let Some(needle) = filter.title_contains.as_deref().filter(|n| !n.is_empty()) {
            // Postgres LIKE is case-sensitive, so compare lowered titles
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(file_records::Column::Title)))
                    .like(format!("%{}%", needle.to_lowercase())),
            );
        }

        let records = query
            .order_by_desc(file_records::Column::CreatedAt)
            .limit(filter.limit)
            .all(&self.db)
            .await?;
        Ok(records)
    }

    pub async fn update_verification(
        &self,
        id: &str,
        verified: bool,
    ) -> Result<file_records::Model, RecordError> {
        let record = self.find_by_id(id).await?;
        let mut active: file_records::ActiveModel = record.into();
        active.is_verified = Set(Some(verified));
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), RecordError> {
        let res = FileRecords::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(RecordError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
