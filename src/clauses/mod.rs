mod filter;
mod modifiers;

pub use filter::{CompareOp, Filter};
pub use modifiers::{CountMode, OrderBy};

pub(crate) use filter::quote_ident;
