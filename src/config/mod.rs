pub mod fee_config;
pub mod minio_config;
pub mod pipeline_config;

pub use fee_config::*;
pub use minio_config::*;
pub use pipeline_config::*;
