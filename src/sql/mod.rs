//! Safe SQL builder: identifiers validated and quoted, values as parameters.

mod builder;
mod filter;
mod params;

pub use builder::*;
pub use filter::{ColumnSetter, Operand, Operator, WhereFilter};
pub(crate) use params::bind_params;
