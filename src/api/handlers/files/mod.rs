pub mod archive;
pub mod download;
pub mod list;
pub mod manage;
pub mod types;
pub mod upload;

// Re-export all types
pub use types::*;

// Re-export all handlers
pub use archive::{download_folder, folder_entries};
pub use download::{download_content, grant_access};
pub use list::list_files;
pub use manage::{delete_item, verify_item};
pub use upload::{upload_file, upload_folder};
