#[macro_use]
mod macros;

pub mod constraint;
pub mod decls;
pub mod favor;
pub mod gen;
pub mod linked;
pub mod member;
pub mod pattern;
pub mod store;
pub mod subst;
pub mod ty;

pub use constraint::{Constraint, ConstraintKind, Locator, LocatorElt, OverloadChoice};
pub use decls::{DeclId, DeclInfo, DeclTable, NominalInfo};
pub use gen::{generate_constraints, sanitize, ConstraintGenerator};
pub use store::ConstraintSystem;
pub use subst::{ApplySubst, Subst};
pub use ty::{Capability, Ty, TyScheme, TyVar, TyVarOptions};
