pub mod cache;
pub mod persistent;

pub use cache::*;
pub use persistent::*;
