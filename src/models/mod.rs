pub mod alias_table;
pub mod data_models;

pub use alias_table::*;
pub use data_models::*;
