use std::fmt;

use fnv::{FnvHashMap, FnvHashSet};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{LumaError, LumaErrorKind, LumaResult},
    typing::ty::{Capability, Ty, TyScheme},
};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct DeclId(pub usize);

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclInfo {
    pub name: String,
    pub ty: TyScheme,
    /// Trailing parameters with default values; callers may omit them.
    pub default_params: usize,
    /// A protocol's own requirement, as opposed to a concrete override.
    pub is_requirement: bool,
    pub failable_init: bool,
    pub valid: bool,
}

impl DeclInfo {
    pub fn new<S: Into<String>, T: Into<TyScheme>>(name: S, ty: T) -> DeclInfo {
        DeclInfo {
            name: name.into(),
            ty: ty.into(),
            default_params: 0,
            is_requirement: false,
            failable_init: false,
            valid: true,
        }
    }

    pub fn with_default_params(mut self, n: usize) -> DeclInfo {
        self.default_params = n;
        self
    }

    pub fn requirement(mut self) -> DeclInfo {
        self.is_requirement = true;
        self
    }

    pub fn failable(mut self) -> DeclInfo {
        self.failable_init = true;
        self
    }

    pub fn invalid(mut self) -> DeclInfo {
        self.valid = false;
        self
    }

    /// Required and total parameter counts, when the declared type is a
    /// function type.
    pub fn param_counts(&self) -> Option<(usize, usize)> {
        let (params, _) = self.ty.ty.func_parts()?;
        Some((params.len() - self.default_params, params.len()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NominalInfo {
    pub conformances: FnvHashSet<Capability>,
    /// The Equatable conformance is compiler-derived rather than declared.
    pub derives_equatable: bool,
    pub eq_witness: Option<DeclId>,
    pub has_failable_init: bool,
}

impl NominalInfo {
    pub fn new() -> NominalInfo {
        NominalInfo::default()
    }

    pub fn conforming<C: IntoIterator<Item = Capability>>(caps: C) -> NominalInfo {
        NominalInfo {
            conformances: caps.into_iter().collect(),
            ..NominalInfo::default()
        }
    }
}

lazy_static! {
    static ref LITERAL_DEFAULTS: Vec<(Capability, Ty)> = vec![
        (Capability::IntegerLiteral, Ty::int()),
        (Capability::FloatLiteral, Ty::float()),
        (Capability::StringLiteral, Ty::string()),
        (Capability::Boolean, Ty::bool()),
    ];
    static ref BUILTIN_NOMINALS: Vec<(&'static str, Vec<Capability>)> = vec![
        ("int", vec![Capability::IntegerLiteral, Capability::Equatable]),
        (
            "float",
            vec![
                Capability::IntegerLiteral,
                Capability::FloatLiteral,
                Capability::Equatable
            ]
        ),
        (
            "string",
            vec![Capability::StringLiteral, Capability::Equatable]
        ),
        ("bool", vec![Capability::Boolean, Capability::Equatable]),
        ("list", vec![Capability::ArrayLiteral]),
        ("map", vec![Capability::DictionaryLiteral]),
    ];
}

/// The declaration, conformance, and literal-default oracle consulted during
/// generation. Populated by earlier name-resolution phases.
#[derive(Clone, Debug, Default)]
pub struct DeclTable {
    decls: Vec<DeclInfo>,
    nominals: FnvHashMap<String, NominalInfo>,
    defaults: FnvHashMap<Capability, Ty>,
}

impl DeclTable {
    pub fn new() -> DeclTable {
        let mut table = DeclTable {
            decls: vec![],
            nominals: FnvHashMap::default(),
            defaults: FnvHashMap::default(),
        };

        for (cap, ty) in LITERAL_DEFAULTS.iter() {
            table.defaults.insert(*cap, ty.clone());
        }

        for (name, caps) in BUILTIN_NOMINALS.iter() {
            table
                .nominals
                .insert(str!(name), NominalInfo::conforming(caps.iter().copied()));
        }

        table
    }

    pub fn define(&mut self, info: DeclInfo) -> LumaResult<DeclId> {
        if info.default_params != 0 {
            match info.ty.ty.func_parts() {
                Some((params, _)) if info.default_params <= params.len() => {}
                Some(_) => {
                    return Err(LumaError::new(
                        format!(
                            "declaration `{}` has more defaulted parameters than parameters",
                            info.name
                        ),
                        LumaErrorKind::Name,
                    ))
                }
                _ => {
                    return Err(LumaError::new(
                        format!(
                            "declaration `{}` has defaulted parameters but no function type",
                            info.name
                        ),
                        LumaErrorKind::Name,
                    ))
                }
            }
        }

        let id = DeclId(self.decls.len());
        self.decls.push(info);
        Ok(id)
    }

    pub fn add_nominal<S: Into<String>>(&mut self, name: S, info: NominalInfo) {
        self.nominals.insert(name.into(), info);
    }

    pub fn nominal_mut(&mut self, name: &str) -> Option<&mut NominalInfo> {
        self.nominals.get_mut(name)
    }

    pub fn get(&self, id: DeclId) -> Option<&DeclInfo> {
        self.decls.get(id.0)
    }

    pub fn validate_decl(&self, id: DeclId) -> bool {
        self.get(id).map(|d| d.valid).unwrap_or(false)
    }

    pub fn declared_ty(&self, id: DeclId) -> Option<&TyScheme> {
        self.get(id).map(|d| &d.ty)
    }

    pub fn default_ty(&self, cap: Capability) -> Option<Ty> {
        self.defaults.get(&cap).cloned()
    }

    pub fn set_default_ty(&mut self, cap: Capability, ty: Ty) {
        self.defaults.insert(cap, ty);
    }

    pub fn conforms_to(&self, ty: &Ty, cap: Capability) -> bool {
        match ty.nominal_name() {
            Some(name) => self
                .nominals
                .get(name)
                .map(|n| n.conformances.contains(&cap))
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn derives_equatable(&self, ty: &Ty) -> bool {
        ty.nominal_name()
            .and_then(|name| self.nominals.get(name))
            .map(|n| n.derives_equatable)
            .unwrap_or(false)
    }

    pub fn equality_witness(&self, ty: &Ty) -> Option<DeclId> {
        self.nominals.get(ty.nominal_name()?)?.eq_witness
    }

    pub fn has_failable_init(&self, ty: &Ty) -> bool {
        ty.nominal_name()
            .and_then(|name| self.nominals.get(name))
            .map(|n| n.has_failable_init)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod decl_tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let table = DeclTable::new();
        assert_eq!(table.default_ty(Capability::IntegerLiteral), Some(Ty::int()));
        assert_eq!(table.default_ty(Capability::FloatLiteral), Some(Ty::float()));
        assert_eq!(table.default_ty(Capability::ArrayLiteral), None);
        assert!(table.conforms_to(&Ty::list(Ty::int()), Capability::ArrayLiteral));
        assert!(!table.conforms_to(&Ty::int(), Capability::ArrayLiteral));
    }

    #[test]
    fn test_define_rejects_bad_defaults() {
        let mut table = DeclTable::new();
        let res = table.define(
            DeclInfo::new("f", Ty::func(vec![Ty::int()], Ty::unit())).with_default_params(2),
        );
        assert!(res.is_err());

        let res = table.define(DeclInfo::new("x", Ty::int()).with_default_params(1));
        assert!(res.is_err());

        let id = table
            .define(DeclInfo::new("g", Ty::func(vec![Ty::int()], Ty::unit())))
            .unwrap();
        assert!(table.validate_decl(id));
    }

    #[test]
    fn test_invalid_decl() {
        let mut table = DeclTable::new();
        let id = table.define(DeclInfo::new("broken", Ty::int()).invalid()).unwrap();
        assert!(!table.validate_decl(id));
    }
}
