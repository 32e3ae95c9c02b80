pub mod date_normalizer;
pub mod fuzzy_matcher;
pub mod header_locator;
pub mod rate_assembler;
pub mod schema_normalizer;
pub mod sheet_flattener;
pub mod sheet_pipeline;

pub use date_normalizer::*;
pub use fuzzy_matcher::*;
pub use header_locator::*;
pub use rate_assembler::*;
pub use schema_normalizer::*;
pub use sheet_flattener::*;
pub use sheet_pipeline::*;
