use std::fmt;

use crate::{
    ast::{Node, Pattern},
    typing::{decls::DeclId, ty::Ty},
    utils::{join, map_join},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApplyStyle {
    Call,
    Binary,
    Prefix,
    Postfix,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CastKind {
    Coerce,
    Conditional,
    Forced,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnwrapKind {
    Bind,
    Force,
    OptionalTry,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TupleExprElt {
    pub label: Option<String>,
    pub expr: Node<Expr>,
}

impl From<Node<Expr>> for TupleExprElt {
    fn from(expr: Node<Expr>) -> TupleExprElt {
        TupleExprElt { label: None, expr }
    }
}

impl fmt::Display for TupleExprElt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}: {}", label, self.expr)
        } else {
            write!(f, "{}", self.expr)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A node that earlier phases already rejected.
    Error,
    Literal(Literal),
    /// Reference to a single resolved declaration.
    Name {
        decl: DeclId,
        specialized: bool,
    },
    /// A name that resolved to several candidate declarations.
    OverloadedName {
        name: String,
        decls: Vec<DeclId>,
        specialized: bool,
    },
    /// Member access where the declaration is not yet known.
    Member {
        base: Box<Node<Expr>>,
        name: String,
    },
    /// Member access with a resolved declaration.
    MemberRef {
        base: Box<Node<Expr>>,
        name: String,
        decl: DeclId,
    },
    OverloadedMember {
        base: Box<Node<Expr>>,
        name: String,
        decls: Vec<DeclId>,
    },
    Subscript {
        base: Box<Node<Expr>>,
        index: Box<Node<Expr>>,
        decl: Option<DeclId>,
    },
    Tuple(Vec<TupleExprElt>),
    Array(Vec<Node<Expr>>),
    Dict(Vec<(Node<Expr>, Node<Expr>)>),
    Paren(Box<Node<Expr>>),
    Apply {
        callee: Box<Node<Expr>>,
        arg: Box<Node<Expr>>,
        style: ApplyStyle,
    },
    Closure {
        params: Box<Node<Pattern>>,
        ret: Option<Ty>,
        body: Option<Box<Node<Expr>>>,
    },
    If {
        cond: Box<Node<Expr>>,
        then: Box<Node<Expr>>,
        els: Box<Node<Expr>>,
    },
    Is {
        operand: Box<Node<Expr>>,
        target: Ty,
    },
    Cast {
        operand: Box<Node<Expr>>,
        target: Ty,
        kind: CastKind,
    },
    Unwrap {
        operand: Box<Node<Expr>>,
        kind: UnwrapKind,
    },
    InOut(Box<Node<Expr>>),
    DynamicType(Box<Node<Expr>>),
    Assign {
        lhs: Box<Node<Expr>>,
        rhs: Box<Node<Expr>>,
    },
    /// The `_` assignment destination.
    Discard,
    /// A type used in expression position; its value is the metatype.
    TypeRef(Ty),
    /// Implicit conversion artifact from an earlier resolution attempt.
    ImplicitCoerce(Box<Node<Expr>>),
    /// Dot-syntax call artifact from an earlier resolution attempt.
    DotCall {
        base: Box<Node<Expr>>,
        name: String,
        decls: Vec<DeclId>,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Error => write!(f, "<error>"),
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Name { decl, .. } => write!(f, "decl#{}", decl),
            Expr::OverloadedName { name, .. } => write!(f, "{}", name),
            Expr::Member { base, name } => write!(f, "{}.{}", base, name),
            Expr::MemberRef { base, name, .. } => write!(f, "{}.{}", base, name),
            Expr::OverloadedMember { base, name, .. } => write!(f, "{}.{}", base, name),
            Expr::Subscript { base, index, .. } => write!(f, "{}[{}]", base, index),
            Expr::Tuple(elts) => write!(f, "({})", join(elts, ", ")),
            Expr::Array(elts) => write!(f, "[{}]", join(elts, ", ")),
            Expr::Dict(entries) => write!(
                f,
                "[{}]",
                map_join(entries, ", ", |(k, v)| format!("{}: {}", k, v))
            ),
            Expr::Paren(ex) => write!(f, "({})", ex),
            Expr::Apply { callee, arg, style } => match style {
                ApplyStyle::Call => write!(f, "{}{}", callee, arg),
                ApplyStyle::Binary => write!(f, "({} {})", callee, arg),
                ApplyStyle::Prefix => write!(f, "{}{}", callee, arg),
                ApplyStyle::Postfix => write!(f, "{}{}", arg, callee),
            },
            Expr::Closure { params, body, .. } => match body {
                Some(body) => write!(f, "{{ {} in {} }}", params, body),
                _ => write!(f, "{{ {} in }}", params),
            },
            Expr::If { cond, then, els } => {
                write!(f, "if {} then {} else {}", cond, then, els)
            }
            Expr::Is { operand, target } => write!(f, "{} is {}", operand, target),
            Expr::Cast {
                operand,
                target,
                kind,
            } => match kind {
                CastKind::Coerce => write!(f, "{} as {}", operand, target),
                CastKind::Conditional => write!(f, "{} as? {}", operand, target),
                CastKind::Forced => write!(f, "{} as! {}", operand, target),
            },
            Expr::Unwrap { operand, kind } => match kind {
                UnwrapKind::Bind => write!(f, "{}?", operand),
                UnwrapKind::Force => write!(f, "{}!", operand),
                UnwrapKind::OptionalTry => write!(f, "try? {}", operand),
            },
            Expr::InOut(ex) => write!(f, "&{}", ex),
            Expr::DynamicType(ex) => write!(f, "typeof({})", ex),
            Expr::Assign { lhs, rhs } => write!(f, "{} = {}", lhs, rhs),
            Expr::Discard => write!(f, "_"),
            Expr::TypeRef(ty) => write!(f, "{}", ty),
            Expr::ImplicitCoerce(ex) => write!(f, "{}", ex),
            Expr::DotCall { base, name, .. } => write!(f, "{}.{}", base, name),
        }
    }
}

impl Expr {
    pub fn desc(&self) -> &'static str {
        match self {
            Expr::Error => "error",
            Expr::Literal(_) => "literal",
            Expr::Name { .. } => "name",
            Expr::OverloadedName { .. } => "overloaded name",
            Expr::Member { .. } => "member",
            Expr::MemberRef { .. } => "member ref",
            Expr::OverloadedMember { .. } => "overloaded member",
            Expr::Subscript { .. } => "subscript",
            Expr::Tuple(_) => "tuple",
            Expr::Array(_) => "array",
            Expr::Dict(_) => "dictionary",
            Expr::Paren(_) => "paren",
            Expr::Apply { .. } => "apply",
            Expr::Closure { .. } => "closure",
            Expr::If { .. } => "if",
            Expr::Is { .. } => "is",
            Expr::Cast { .. } => "cast",
            Expr::Unwrap { .. } => "unwrap",
            Expr::InOut(_) => "inout",
            Expr::DynamicType(_) => "dynamic type",
            Expr::Assign { .. } => "assign",
            Expr::Discard => "discard",
            Expr::TypeRef(_) => "type",
            Expr::ImplicitCoerce(_) => "implicit coercion",
            Expr::DotCall { .. } => "dot call",
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }

    pub fn is_integer_literal(&self) -> bool {
        matches!(self, Expr::Literal(Literal::Int(_)))
    }

    pub fn is_binary_apply(&self) -> bool {
        matches!(
            self,
            Expr::Apply {
                style: ApplyStyle::Binary,
                ..
            }
        )
    }

    /// Visit each direct child expression node.
    pub fn each_child<'a, F: FnMut(&'a Node<Expr>)>(&'a self, f: &mut F) {
        match self {
            Expr::Error
            | Expr::Literal(_)
            | Expr::Name { .. }
            | Expr::OverloadedName { .. }
            | Expr::Discard
            | Expr::TypeRef(_) => {}
            Expr::Member { base, .. }
            | Expr::MemberRef { base, .. }
            | Expr::OverloadedMember { base, .. }
            | Expr::DotCall { base, .. } => f(base),
            Expr::Subscript { base, index, .. } => {
                f(base);
                f(index);
            }
            Expr::Tuple(elts) => {
                for elt in elts {
                    f(&elt.expr);
                }
            }
            Expr::Array(elts) => {
                for elt in elts {
                    f(elt);
                }
            }
            Expr::Dict(entries) => {
                for (k, v) in entries {
                    f(k);
                    f(v);
                }
            }
            Expr::Paren(ex)
            | Expr::InOut(ex)
            | Expr::DynamicType(ex)
            | Expr::ImplicitCoerce(ex) => f(ex),
            Expr::Apply { callee, arg, .. } => {
                f(callee);
                f(arg);
            }
            Expr::Closure { body, .. } => {
                if let Some(body) = body {
                    f(body);
                }
            }
            Expr::If { cond, then, els } => {
                f(cond);
                f(then);
                f(els);
            }
            Expr::Is { operand, .. }
            | Expr::Cast { operand, .. }
            | Expr::Unwrap { operand, .. } => f(operand),
            Expr::Assign { lhs, rhs } => {
                f(lhs);
                f(rhs);
            }
        }
    }

    /// A literal array or dictionary construction, looking through parens.
    pub fn collection_literal(&self) -> Option<&Expr> {
        match self {
            Expr::Array(_) | Expr::Dict(_) => Some(self),
            Expr::Paren(inner) => inner.value.collection_literal(),
            _ => None,
        }
    }
}
