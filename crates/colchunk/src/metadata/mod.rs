//! Metadata describing where a column chunk lives and how it's shaped.
//!
//! These are constructed by the caller, usually from the file footer.
pub mod column_chunk;
pub mod row_group;
pub mod schema;
