pub mod composer;
pub mod export;
pub mod request;

pub use composer::*;
pub use export::*;
pub use request::*;
