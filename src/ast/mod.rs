mod expr;
mod node;
mod pattern;

pub use expr::*;
pub use node::*;
pub use pattern::*;
