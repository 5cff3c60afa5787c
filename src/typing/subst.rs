use std::{
    iter::FromIterator,
    ops::{Deref, DerefMut},
};

use fnv::FnvHashMap;

use crate::typing::ty::{TupleElt, Ty, TyVar};

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Subst(FnvHashMap<TyVar, Ty>);

impl Deref for Subst {
    type Target = FnvHashMap<TyVar, Ty>;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Subst {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<(TyVar, Ty)> for Subst {
    fn from_iter<T: IntoIterator<Item = (TyVar, Ty)>>(iter: T) -> Self {
        Subst(iter.into_iter().collect())
    }
}

impl std::fmt::Debug for Subst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(k, v)| ((k.to_string(), v.to_string()))))
            .finish()
    }
}

impl Subst {
    pub fn new() -> Subst {
        Subst(FnvHashMap::default())
    }

    pub fn from_types<P, A>(params: P, args: A) -> Subst
    where
        P: IntoIterator<Item = TyVar>,
        A: IntoIterator<Item = Ty>,
    {
        let mut sub = Subst::new();
        for (p, a) in params.into_iter().zip(args.into_iter()) {
            sub.insert(p, a);
        }
        sub
    }
}

pub trait ApplySubst {
    fn apply_subst(self, subst: &Subst) -> Self;
}

impl ApplySubst for Ty {
    fn apply_subst(self, subst: &Subst) -> Ty {
        match self {
            Ty::Var(v) => subst.get(&v).cloned().unwrap_or(Ty::Var(v)),
            Ty::Const(s) => Ty::Const(s),
            Ty::Projection(n, tys) => Ty::Projection(n, tys.apply_subst(subst)),
            Ty::Tuple(elts) => Ty::Tuple(elts.apply_subst(subst)),
            Ty::Func(params, ret) => Ty::Func(params.apply_subst(subst), ret.apply_subst(subst)),
            Ty::Optional(ty) => Ty::Optional(ty.apply_subst(subst)),
            Ty::Metatype(ty) => Ty::Metatype(ty.apply_subst(subst)),
            Ty::LValue(ty) => Ty::LValue(ty.apply_subst(subst)),
            Ty::InOut(ty) => Ty::InOut(ty.apply_subst(subst)),
        }
    }
}

impl ApplySubst for TupleElt {
    fn apply_subst(self, subst: &Subst) -> TupleElt {
        TupleElt {
            ty: self.ty.apply_subst(subst),
            label: self.label,
            variadic: self.variadic,
        }
    }
}

impl<T: ApplySubst> ApplySubst for Vec<T> {
    fn apply_subst(self, subst: &Subst) -> Vec<T> {
        self.into_iter().map(|t| t.apply_subst(subst)).collect()
    }
}

impl<T: ApplySubst> ApplySubst for Box<T> {
    fn apply_subst(self, subst: &Subst) -> Box<T> {
        Box::new((*self).apply_subst(subst))
    }
}

#[cfg(test)]
mod subst_tests {
    use super::*;

    #[test]
    fn test_apply_subst() {
        let sub = subst! {
            tvar!(0) => Ty::int(),
            tvar!(1) => Ty::list(Ty::Var(tvar!(2)))
        };

        let ty = Ty::func(vec![Ty::Var(tvar!(0))], Ty::Var(tvar!(1)));
        assert_eq!(
            ty.apply_subst(&sub),
            Ty::func(vec![Ty::int()], Ty::list(Ty::Var(tvar!(2))))
        );

        // unmapped variables are left alone
        let ty = Ty::Var(tvar!(7));
        assert_eq!(ty.apply_subst(&sub), Ty::Var(tvar!(7)));
    }
}
