use std::collections::VecDeque;

use fnv::{FnvHashMap, FnvHashSet};

use crate::typing::{
    constraint::{Constraint, ConstraintKind, Locator},
    subst::{ApplySubst, Subst},
    ty::{Capability, CollectTyVars, Ty, TyVar, TyVarOptions},
};

#[derive(Clone, Debug)]
pub struct TyVarData {
    pub options: TyVarOptions,
    pub literal: Option<Capability>,
    pub locator: Locator,
}

/// The mutable state of one generation pass: the variable allocator, the
/// indexed constraint list with its variable graph, and the per-node type
/// annotations. Discarded or handed wholesale to the solver when the pass
/// completes.
#[derive(Default)]
pub struct ConstraintSystem {
    var_data: Vec<TyVarData>,
    index: FnvHashMap<u64, Constraint>,
    var_map: FnvHashMap<TyVar, FnvHashSet<u64>>,
    reverse_map: FnvHashMap<u64, FnvHashSet<TyVar>>,
    constraints: VecDeque<u64>,
    node_tys: FnvHashMap<u64, Ty>,
    favored_tys: FnvHashMap<u64, Ty>,
    contextual_tys: FnvHashMap<u64, Ty>,
}

impl std::fmt::Debug for ConstraintSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.constraints.iter().map(|c| self.index.get(c).unwrap()))
            .finish()
    }
}

impl ConstraintSystem {
    pub fn new() -> ConstraintSystem {
        ConstraintSystem::default()
    }

    pub fn fresh_var(&mut self, options: TyVarOptions, locator: Locator) -> TyVar {
        let tv = TyVar(self.var_data.len() as u32);
        self.var_data.push(TyVarData {
            options,
            literal: None,
            locator,
        });
        tv
    }

    pub fn fresh_literal_var(&mut self, cap: Capability, locator: Locator) -> TyVar {
        let tv = TyVar(self.var_data.len() as u32);
        self.var_data.push(TyVarData {
            options: TyVarOptions::default(),
            literal: Some(cap),
            locator,
        });
        tv
    }

    pub fn num_vars(&self) -> usize {
        self.var_data.len()
    }

    pub fn var_options(&self, tv: TyVar) -> TyVarOptions {
        self.var_data
            .get(tv.0 as usize)
            .map(|d| d.options)
            .unwrap_or_default()
    }

    /// The capability a defaulted literal bound to this variable must
    /// satisfy, if the variable was minted for a literal.
    pub fn literal_capability(&self, tv: TyVar) -> Option<Capability> {
        self.var_data.get(tv.0 as usize).and_then(|d| d.literal)
    }

    pub fn var_locator(&self, tv: TyVar) -> Option<&Locator> {
        self.var_data.get(tv.0 as usize).map(|d| &d.locator)
    }

    /// Instantiate a declared type, replacing its quantified variables with
    /// fresh store variables.
    pub fn open_ty(&mut self, scheme: &crate::typing::ty::TyScheme, locator: &Locator) -> Ty {
        if scheme.vars.is_empty() {
            return scheme.ty.clone();
        }

        let fresh = scheme
            .vars
            .iter()
            .map(|_| Ty::Var(self.fresh_var(TyVarOptions::default(), locator.clone())))
            .collect::<Vec<_>>();
        let sub = Subst::from_types(scheme.vars.iter().copied(), fresh);
        scheme.ty.clone().apply_subst(&sub)
    }

    pub fn add(&mut self, kind: ConstraintKind, locator: Locator) -> u64 {
        let c = Constraint::new(kind, locator);
        let id = c.id;
        self.push(c);
        id
    }

    pub fn push(&mut self, c: Constraint) {
        let id = c.id;
        self.index.insert(id, c);
        self.index_constraint(id);
        self.constraints.push_back(id);
    }

    fn index_constraint(&mut self, id: u64) {
        let c = self.index.get(&id).unwrap();
        let tyvars = c.collect_tyvars();
        for v in tyvars.iter() {
            self.var_map.entry(*v).or_default().insert(id);
        }

        self.reverse_map.insert(id, tyvars.into_iter().collect());
    }

    fn unindex_constraint(&mut self, id: u64) {
        if let Some(vars) = self.reverse_map.remove(&id) {
            for v in vars {
                if let Some(cs) = self.var_map.get_mut(&v) {
                    cs.remove(&id);
                }
            }
        }
    }

    pub fn get_constraint(&self, id: u64) -> Option<&Constraint> {
        self.index.get(&id)
    }

    /// All constraints mentioning the variable, in insertion order.
    pub fn gather_constraints(&self, tv: TyVar) -> Vec<&Constraint> {
        let ids = unless!(self.var_map.get(&tv), else return vec![]);
        self.constraints
            .iter()
            .filter(|id| ids.contains(id))
            .map(|id| self.index.get(id).unwrap())
            .collect()
    }

    /// Swap a constraint for a replacement in one step: the old constraint is
    /// unindexed and the new one indexed at the same list position, so no
    /// lookup can observe both or neither.
    pub fn replace_constraint(&mut self, old_id: u64, new: Constraint) -> bool {
        let pos = match self.constraints.iter().position(|&id| id == old_id) {
            Some(pos) => pos,
            _ => return false,
        };

        self.unindex_constraint(old_id);
        self.index.remove(&old_id);

        let new_id = new.id;
        self.constraints[pos] = new_id;
        self.index.insert(new_id, new);
        self.index_constraint(new_id);
        true
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().map(move |id| self.index.get(id).unwrap())
    }

    pub fn into_constraints(mut self) -> Vec<Constraint> {
        let mut v = vec![];
        for id in std::mem::take(&mut self.constraints) {
            v.push(self.index.remove(&id).unwrap());
        }
        v
    }

    pub fn set_ty(&mut self, node_id: u64, ty: Ty) {
        self.node_tys.insert(node_id, ty);
    }

    pub fn ty(&self, node_id: u64) -> Option<&Ty> {
        self.node_tys.get(&node_id)
    }

    pub fn set_favored_ty(&mut self, node_id: u64, ty: Ty) {
        self.favored_tys.insert(node_id, ty);
    }

    pub fn favored_ty(&self, node_id: u64) -> Option<&Ty> {
        self.favored_tys.get(&node_id)
    }

    /// The expected type flowing in from the node's position, supplied by the
    /// caller before generation.
    pub fn set_contextual_ty(&mut self, node_id: u64, ty: Ty) {
        self.contextual_tys.insert(node_id, ty);
    }

    pub fn contextual_ty(&self, node_id: u64) -> Option<&Ty> {
        self.contextual_tys.get(&node_id)
    }
}
