pub mod archive;
pub mod authorizer;
pub mod file_service;
pub mod memory_storage;
pub mod record_store;
pub mod storage;
pub mod transfer;
