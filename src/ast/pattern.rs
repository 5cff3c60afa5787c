use std::fmt;

use crate::{ast::Node, typing::ty::TyScheme, utils::join};

#[derive(Clone, Debug, PartialEq)]
pub struct TuplePatElt {
    pub pattern: Node<Pattern>,
    pub label: Option<String>,
    pub variadic: bool,
}

impl fmt::Display for TuplePatElt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}: ", label)?;
        }
        write!(f, "{}", self.pattern)?;
        if self.variadic {
            write!(f, "...")?;
        }
        Ok(())
    }
}

impl From<Node<Pattern>> for TuplePatElt {
    fn from(pattern: Node<Pattern>) -> TuplePatElt {
        TuplePatElt {
            pattern,
            label: None,
            variadic: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Paren(Box<Node<Pattern>>),
    /// A `let`/`var` re-binding wrapper around a sub-pattern.
    Binding(Box<Node<Pattern>>),
    Wildcard,
    Name(String),
    Typed {
        pattern: Box<Node<Pattern>>,
        ty: TyScheme,
    },
    Tuple(Vec<TuplePatElt>),
    /// Pattern kinds only legal in conditional bindings.
    Refutable,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Paren(p) => write!(f, "({})", p),
            Pattern::Binding(p) => write!(f, "let {}", p),
            Pattern::Wildcard => write!(f, "_"),
            Pattern::Name(name) => write!(f, "{}", name),
            Pattern::Typed { pattern, ty } => write!(f, "{}: {}", pattern, ty),
            Pattern::Tuple(elts) => write!(f, "({})", join(elts, ", ")),
            Pattern::Refutable => write!(f, "<refutable>"),
        }
    }
}

impl Pattern {
    pub fn arity(&self) -> Option<usize> {
        match self {
            Pattern::Tuple(elts) => Some(elts.len()),
            Pattern::Paren(p) | Pattern::Binding(p) => p.value.arity(),
            _ => None,
        }
    }
}
