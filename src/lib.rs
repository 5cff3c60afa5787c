#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod macros;

pub mod ast;
pub mod errors;
pub mod pathlib;
pub mod span;
pub mod typing;
pub mod utils;
