use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One uploaded file or one uploaded folder. Folder members never get rows of their own.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub title: String,
    pub filename: String,
    /// Object key for a file, key prefix (ending in `/`) for a folder
    pub file_path: String,
    pub secret_code: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub is_folder: bool,
    pub file_count: Option<i32>,
    pub is_verified: Option<bool>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
