//! Shared server interface and test helpers

pub mod test_utils;
pub mod traits;

pub use traits::OriginServerTrait;
