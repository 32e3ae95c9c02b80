pub mod minio_client;
pub mod storage_manager;
pub mod table_store;

pub use minio_client::*;
pub use storage_manager::*;
pub use table_store::*;
