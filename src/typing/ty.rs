use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::join;

/// A named requirement a type may satisfy, checked through the declaration
/// table. Literal capabilities also carry a default type used when the solver
/// is otherwise unconstrained.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    ArrayLiteral,
    DictionaryLiteral,
    Boolean,
    Equatable,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Capability::IntegerLiteral => "integer literal",
                Capability::FloatLiteral => "float literal",
                Capability::StringLiteral => "string literal",
                Capability::ArrayLiteral => "array literal",
                Capability::DictionaryLiteral => "dictionary literal",
                Capability::Boolean => "boolean",
                Capability::Equatable => "equatable",
            }
        )
    }
}

impl Capability {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Capability::IntegerLiteral
                | Capability::FloatLiteral
                | Capability::StringLiteral
                | Capability::ArrayLiteral
                | Capability::DictionaryLiteral
        )
    }
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TyVar(pub u32);

impl fmt::Display for TyVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?t{}", self.0)
    }
}

bitflags::bitflags! {
    /// Per-variable solver hints, fixed at creation time.
    pub struct TyVarOptions: u8 {
        const CAN_BIND_TO_LVALUE = 1 << 0;
        const PREFERS_SUBTYPE_BINDING = 1 << 1;
    }
}

impl Default for TyVarOptions {
    fn default() -> TyVarOptions {
        TyVarOptions::empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TupleElt {
    pub ty: Ty,
    pub label: Option<String>,
    pub variadic: bool,
}

impl From<Ty> for TupleElt {
    fn from(ty: Ty) -> TupleElt {
        TupleElt {
            ty,
            label: None,
            variadic: false,
        }
    }
}

impl fmt::Display for TupleElt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}: ", label)?;
        }
        write!(f, "{}", self.ty)?;
        if self.variadic {
            write!(f, "...")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ty {
    Var(TyVar),
    Const(String),
    Projection(String, Vec<Ty>),
    Tuple(Vec<TupleElt>),
    Func(Vec<Ty>, Box<Ty>),
    Optional(Box<Ty>),
    Metatype(Box<Ty>),
    LValue(Box<Ty>),
    InOut(Box<Ty>),
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "{}", v),
            Ty::Const(s) => write!(f, "{}", s),
            Ty::Projection(n, tys) => {
                if tys.len() != 0 {
                    write!(f, "{}[{}]", n, join(tys, ", "))
                } else {
                    write!(f, "{}", n)
                }
            }
            Ty::Tuple(elts) => write!(f, "({})", join(elts, ", ")),
            Ty::Func(params, ret) => write!(f, "({}) -> {}", join(params, ", "), ret),
            Ty::Optional(ty) => write!(f, "{}?", ty),
            Ty::Metatype(ty) => write!(f, "{}.Type", ty),
            Ty::LValue(ty) => write!(f, "@lvalue {}", ty),
            Ty::InOut(ty) => write!(f, "inout {}", ty),
        }
    }
}

impl Default for Ty {
    fn default() -> Ty {
        Ty::unit()
    }
}

impl Ty {
    pub fn unit() -> Ty {
        Ty::Tuple(vec![])
    }

    pub fn int() -> Ty {
        Ty::Const(str!("int"))
    }

    pub fn float() -> Ty {
        Ty::Const(str!("float"))
    }

    pub fn string() -> Ty {
        Ty::Const(str!("string"))
    }

    pub fn bool() -> Ty {
        Ty::Const(str!("bool"))
    }

    pub fn list(elt: Ty) -> Ty {
        Ty::Projection(str!("list"), vec![elt])
    }

    pub fn map(key: Ty, value: Ty) -> Ty {
        Ty::Projection(str!("map"), vec![key, value])
    }

    pub fn func<P: IntoIterator<Item = Ty>>(params: P, ret: Ty) -> Ty {
        Ty::Func(params.into_iter().collect(), Box::new(ret))
    }

    pub fn optional(ty: Ty) -> Ty {
        Ty::Optional(Box::new(ty))
    }

    pub fn lvalue(ty: Ty) -> Ty {
        Ty::LValue(Box::new(ty))
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Ty::Var(_))
    }

    pub fn get_var(&self) -> Option<TyVar> {
        match self {
            Ty::Var(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_lvalue(&self) -> bool {
        matches!(self, Ty::LValue(_))
    }

    /// The type with any l-value wrapper removed.
    pub fn rvalue(&self) -> &Ty {
        match self {
            Ty::LValue(ty) => ty.rvalue(),
            ty => ty,
        }
    }

    pub fn nominal_name(&self) -> Option<&str> {
        match self.rvalue() {
            Ty::Const(n) => Some(n),
            Ty::Projection(n, _) => Some(n),
            _ => None,
        }
    }

    /// The element type of a list container, if this is one.
    pub fn list_element_ty(&self) -> Option<&Ty> {
        match self.rvalue() {
            Ty::Projection(n, tys) if n == "list" && tys.len() == 1 => Some(&tys[0]),
            _ => None,
        }
    }

    /// The key and value types of a map container, if this is one.
    pub fn map_entry_tys(&self) -> Option<(&Ty, &Ty)> {
        match self.rvalue() {
            Ty::Projection(n, tys) if n == "map" && tys.len() == 2 => Some((&tys[0], &tys[1])),
            _ => None,
        }
    }

    pub fn func_parts(&self) -> Option<(&Vec<Ty>, &Ty)> {
        match self.rvalue() {
            Ty::Func(params, ret) => Some((params, ret)),
            _ => None,
        }
    }

    pub fn result_ty(&self) -> Option<&Ty> {
        self.func_parts().map(|(_, ret)| ret)
    }

    pub fn is_mono(&self) -> bool {
        self.collect_tyvars().is_empty()
    }
}

pub trait CollectTyVars {
    fn collect_tyvars(&self) -> Vec<TyVar>;
}

impl CollectTyVars for Ty {
    fn collect_tyvars(&self) -> Vec<TyVar> {
        match self {
            Ty::Var(v) => vec![*v],
            Ty::Const(_) => vec![],
            Ty::Projection(_, tys) => tys.collect_tyvars(),
            Ty::Tuple(elts) => {
                let mut vars = vec![];
                for elt in elts {
                    vars.extend(elt.ty.collect_tyvars());
                }
                vars
            }
            Ty::Func(params, ret) => {
                let mut vars = params.collect_tyvars();
                vars.extend(ret.collect_tyvars());
                vars
            }
            Ty::Optional(ty) | Ty::Metatype(ty) | Ty::LValue(ty) | Ty::InOut(ty) => {
                ty.collect_tyvars()
            }
        }
    }
}

impl CollectTyVars for Vec<Ty> {
    fn collect_tyvars(&self) -> Vec<TyVar> {
        let mut vars = vec![];
        for ty in self {
            vars.extend(ty.collect_tyvars());
        }
        vars
    }
}

/// A possibly-quantified declared type. The quantified variables are local to
/// the scheme and are replaced with fresh store variables when the scheme is
/// opened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TyScheme {
    pub vars: Vec<TyVar>,
    pub ty: Ty,
}

impl fmt::Display for TyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.vars.len() != 0 {
            write!(f, "All[{}]{}", join(&self.vars, ", "), self.ty)
        } else {
            write!(f, "{}", self.ty)
        }
    }
}

impl From<Ty> for TyScheme {
    fn from(ty: Ty) -> TyScheme {
        TyScheme::from_mono(ty)
    }
}

impl TyScheme {
    pub fn from_mono(ty: Ty) -> TyScheme {
        TyScheme { vars: vec![], ty }
    }

    pub fn new(vars: Vec<TyVar>, ty: Ty) -> TyScheme {
        TyScheme { vars, ty }
    }

    pub fn is_mono(&self) -> bool {
        self.vars.is_empty()
    }

    /// The underlying type when nothing is quantified.
    pub fn mono(&self) -> Option<&Ty> {
        if self.vars.is_empty() {
            Some(&self.ty)
        } else {
            None
        }
    }
}
