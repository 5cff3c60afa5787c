use rand::Rng;

use crate::{
    typing::{
        decls::DeclId,
        ty::{Capability, CollectTyVars, Ty, TyVar},
    },
    utils::{join, map_join},
};

/// A role tag along a locator path, identifying which part of a node a
/// constraint talks about.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LocatorElt {
    Member(String),
    SubscriptIndex,
    SubscriptResult,
    ApplyFunction,
    ApplyArgument,
    TupleElement(usize),
    ClosureResult,
    RvalueAdjustment,
    CastType,
    ConditionalBranch,
}

impl std::fmt::Display for LocatorElt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocatorElt::Member(name) => write!(f, "member({})", name),
            LocatorElt::SubscriptIndex => write!(f, "subscript index"),
            LocatorElt::SubscriptResult => write!(f, "subscript result"),
            LocatorElt::ApplyFunction => write!(f, "apply function"),
            LocatorElt::ApplyArgument => write!(f, "apply argument"),
            LocatorElt::TupleElement(i) => write!(f, "tuple element #{}", i),
            LocatorElt::ClosureResult => write!(f, "closure result"),
            LocatorElt::RvalueAdjustment => write!(f, "rvalue adjustment"),
            LocatorElt::CastType => write!(f, "cast type"),
            LocatorElt::ConditionalBranch => write!(f, "conditional branch"),
        }
    }
}

/// A path from a tree root through expression identity plus role tags,
/// resolvable back to the node that produced a constraint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Locator {
    pub anchor: u64,
    pub path: Vec<LocatorElt>,
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{:x}", self.anchor)?;
        for elt in &self.path {
            write!(f, " → {}", elt)?;
        }
        Ok(())
    }
}

impl Locator {
    pub fn new(anchor: u64) -> Locator {
        Locator {
            anchor,
            path: vec![],
        }
    }

    pub fn with(mut self, elt: LocatorElt) -> Locator {
        self.path.push(elt);
        self
    }
}

/// One declaration that could satisfy a name reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OverloadChoice {
    /// The access base, for member overloads that need rebasing.
    pub base_ty: Option<Ty>,
    pub decl: DeclId,
    pub specialized: bool,
}

impl std::fmt::Display for OverloadChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(base) = &self.base_ty {
            write!(f, "{}.decl#{}", base, self.decl)
        } else {
            write!(f, "decl#{}", self.decl)
        }
    }
}

impl OverloadChoice {
    pub fn new(decl: DeclId) -> OverloadChoice {
        OverloadChoice {
            base_ty: None,
            decl,
            specialized: false,
        }
    }

    pub fn with_base(mut self, base_ty: Ty) -> OverloadChoice {
        self.base_ty = Some(base_ty);
        self
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Equal(Ty, Ty),
    Conversion(Ty, Ty),
    /// Tuple-to-parameter-list conversion.
    ArgConversion(Ty, Ty),
    ConformsTo(Ty, Capability),
    ValueMember(Ty, String, Ty),
    TypeMember(Ty, String, Ty),
    /// Binds a variable to one concrete declaration's type, adjusted for the
    /// access base.
    BindOverload(Ty, OverloadChoice),
    /// The caller's argument tuple, shaped as a function type, applies to the
    /// callee's function type. The flag marks a non-escaping literal closure
    /// callee.
    ApplicableFn(Ty, Ty, bool),
    CheckedCast(Ty, Ty),
    ExplicitConversion(Ty, Ty),
    OptionalObject(Ty, Ty),
    DynamicTypeOf(Ty, Ty),
    /// Fallback binding if the variable is otherwise unconstrained.
    Defaultable(Ty, Ty),
    /// Ordered alternatives; the solver must try each.
    Disjunction(Vec<Constraint>),
}

impl std::fmt::Debug for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintKind::Equal(s, t) => write!(f, "{} ≡ {}", s, t),
            ConstraintKind::Conversion(s, t) => write!(f, "{} ≤ {}", s, t),
            ConstraintKind::ArgConversion(s, t) => write!(f, "{} ≤ₐ {}", s, t),
            ConstraintKind::ConformsTo(t, cap) => write!(f, "{} ⊢ {}", t, cap),
            ConstraintKind::ValueMember(base, name, t) => {
                write!(f, "{}.{} ≡ {}", base, name, t)
            }
            ConstraintKind::TypeMember(base, name, t) => {
                write!(f, "{}::{} ≡ {}", base, name, t)
            }
            ConstraintKind::BindOverload(t, choice) => write!(f, "{} := {}", t, choice),
            ConstraintKind::ApplicableFn(fn_ty, callee, noescape) => {
                if *noescape {
                    write!(f, "{} ↝ {} (noescape)", fn_ty, callee)
                } else {
                    write!(f, "{} ↝ {}", fn_ty, callee)
                }
            }
            ConstraintKind::CheckedCast(s, t) => write!(f, "CheckedCast({}, {})", s, t),
            ConstraintKind::ExplicitConversion(s, t) => {
                write!(f, "ExplicitConversion({}, {})", s, t)
            }
            ConstraintKind::OptionalObject(s, t) => write!(f, "OptionalObject({}, {})", s, t),
            ConstraintKind::DynamicTypeOf(s, t) => write!(f, "DynamicTypeOf({}, {})", s, t),
            ConstraintKind::Defaultable(s, t) => write!(f, "Defaultable({}, {})", s, t),
            ConstraintKind::Disjunction(cs) => {
                write!(f, "({})", map_join(cs, " ∨ ", |c| format!("{:?}", c.kind)))
            }
        }
    }
}

impl CollectTyVars for ConstraintKind {
    fn collect_tyvars(&self) -> Vec<TyVar> {
        match self {
            ConstraintKind::Equal(s, t)
            | ConstraintKind::Conversion(s, t)
            | ConstraintKind::ArgConversion(s, t)
            | ConstraintKind::CheckedCast(s, t)
            | ConstraintKind::ExplicitConversion(s, t)
            | ConstraintKind::OptionalObject(s, t)
            | ConstraintKind::DynamicTypeOf(s, t)
            | ConstraintKind::Defaultable(s, t)
            | ConstraintKind::ApplicableFn(s, t, _) => {
                let mut vars = s.collect_tyvars();
                vars.extend(t.collect_tyvars());
                vars
            }
            ConstraintKind::ConformsTo(t, _) => t.collect_tyvars(),
            ConstraintKind::ValueMember(base, _, t) | ConstraintKind::TypeMember(base, _, t) => {
                let mut vars = base.collect_tyvars();
                vars.extend(t.collect_tyvars());
                vars
            }
            ConstraintKind::BindOverload(t, choice) => {
                let mut vars = t.collect_tyvars();
                if let Some(base) = &choice.base_ty {
                    vars.extend(base.collect_tyvars());
                }
                vars
            }
            ConstraintKind::Disjunction(cs) => {
                let mut vars = vec![];
                for c in cs {
                    vars.extend(c.collect_tyvars());
                }
                vars
            }
        }
    }
}

#[derive(Clone, Eq)]
pub struct Constraint {
    pub id: u64,
    pub kind: ConstraintKind,
    pub locator: Locator,
    pub favored: bool,
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.locator == other.locator && self.favored == other.favored
    }
}

impl std::hash::Hash for Constraint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.favored {
            write!(f, "{:?} [favored] ({})", self.kind, self.locator)
        } else {
            write!(f, "{:?} ({})", self.kind, self.locator)
        }
    }
}

impl CollectTyVars for Constraint {
    fn collect_tyvars(&self) -> Vec<TyVar> {
        self.kind.collect_tyvars()
    }
}

impl Constraint {
    pub fn new(kind: ConstraintKind, locator: Locator) -> Constraint {
        let mut rng = rand::thread_rng();
        let id = rng.gen::<u64>();
        Constraint {
            id,
            kind,
            locator,
            favored: false,
        }
    }

    pub fn favored(mut self) -> Constraint {
        self.favored = true;
        self
    }

    /// A copy with a fresh identity, so flags can be set independent of the
    /// original.
    pub fn cloned(&self) -> Constraint {
        let mut rng = rand::thread_rng();
        Constraint {
            id: rng.gen::<u64>(),
            kind: self.kind.clone(),
            locator: self.locator.clone(),
            favored: self.favored,
        }
    }

    /// The nested overload alternatives, when this is an overload-shaped
    /// disjunction. Not every disjunction is an overload set.
    pub fn overload_choices(&self) -> Option<&Vec<Constraint>> {
        match &self.kind {
            ConstraintKind::Disjunction(cs)
                if matches!(
                    cs.first().map(|c| &c.kind),
                    Some(ConstraintKind::BindOverload(..))
                ) =>
            {
                Some(cs)
            }
            _ => None,
        }
    }

    pub fn bind_overload_choice(&self) -> Option<&OverloadChoice> {
        match &self.kind {
            ConstraintKind::BindOverload(_, choice) => Some(choice),
            _ => None,
        }
    }
}
