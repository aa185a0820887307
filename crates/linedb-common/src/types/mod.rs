//! Type definitions for linedb.

mod field;
mod ids;

pub use field::FieldType;
pub use ids::IdGenerator;
