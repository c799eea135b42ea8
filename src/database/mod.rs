//! Relational side of the loader: column ranges, schema inference, literal rendering
//! and the sink the rendered rows are written to.

pub mod column;
pub mod literal;
pub mod range;
pub mod schema;
pub mod sink;
