use std::fmt;

use colored::*;

use crate::span::Source;

pub type LumaResult<T = ()> = Result<T, LumaError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LumaErrorKind {
    Name,
    Type,
    Unknown,
}

impl fmt::Display for LumaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                LumaErrorKind::Name => "name error",
                LumaErrorKind::Type => "type error",
                LumaErrorKind::Unknown => "unknown error",
            }
        )
    }
}

#[derive(Debug)]
pub struct LumaError {
    pub msg: String,
    pub src: Vec<Source>,
    pub kind: LumaErrorKind,
}

impl LumaError {
    pub fn new<S: Into<String>>(msg: S, kind: LumaErrorKind) -> LumaError {
        LumaError {
            msg: msg.into(),
            src: vec![],
            kind,
        }
    }

    pub fn with_src(mut self, src: Source) -> LumaError {
        self.src.push(src);
        self
    }

    pub fn emit(self) {
        let kind = format!("{}:", self.kind);
        eprintln!("{} {}", kind.bold().red(), self.msg.bold());

        let arrow = "-->".bold();
        for src in self.src {
            eprintln!(" {} {}", arrow, src);
        }
        eprintln!()
    }
}

impl From<LumaError> for Vec<LumaError> {
    fn from(err: LumaError) -> Vec<LumaError> {
        vec![err]
    }
}
