use crate::{
    ast::{Expr, Node, Pattern},
    typing::{
        constraint::Locator,
        store::ConstraintSystem,
        ty::{TupleElt, Ty, TyVarOptions},
    },
};

/// Derive a type for a binder pattern, minting fresh variables for
/// unannotated leaves. `init` is the initializer the pattern is bound to, if
/// any; a named leaf bound directly to a literal collection reuses the
/// collection's already-generated type instead of minting a variable, which
/// keeps deeply nested literal collection bindings from growing the
/// constraint system exponentially.
pub fn ty_for_pattern(
    pat: &Node<Pattern>,
    for_fn_param: bool,
    init: Option<&Node<Expr>>,
    cs: &mut ConstraintSystem,
) -> Ty {
    match &pat.value {
        Pattern::Paren(sub) | Pattern::Binding(sub) => ty_for_pattern(sub, for_fn_param, init, cs),
        Pattern::Wildcard => Ty::Var(cs.fresh_var(TyVarOptions::default(), Locator::new(pat.id))),
        Pattern::Name(name) => {
            if let Some(bound) = init {
                if bound.value.collection_literal().is_some() {
                    if let Some(ty) = cs.ty(bound.id) {
                        log::debug!("binding `{}` directly to collection type {}", name, ty);
                        return ty.clone();
                    }
                }
            }

            Ty::Var(cs.fresh_var(TyVarOptions::default(), Locator::new(pat.id)))
        }
        Pattern::Typed { ty, .. } => cs.open_ty(ty, &Locator::new(pat.id)),
        Pattern::Tuple(elts) => Ty::Tuple(
            elts.iter()
                .map(|elt| TupleElt {
                    ty: ty_for_pattern(&elt.pattern, for_fn_param, None, cs),
                    label: elt.label.clone(),
                    variadic: elt.variadic,
                })
                .collect(),
        ),
        Pattern::Refutable => {
            Ty::Var(cs.fresh_var(TyVarOptions::default(), Locator::new(pat.id)))
        }
    }
}

#[cfg(test)]
mod pattern_tests {
    use super::*;
    use crate::{
        ast::TuplePatElt,
        typing::ty::{TyScheme, TyVar},
    };

    fn named(name: &str) -> Node<Pattern> {
        Node::new(Pattern::Name(str!(name)))
    }

    #[test]
    fn test_tuple_arity_and_labels_preserved() {
        let pat = Node::new(Pattern::Tuple(vec![
            TuplePatElt {
                pattern: named("a"),
                label: Some(str!("first")),
                variadic: false,
            },
            TuplePatElt {
                pattern: named("b"),
                label: None,
                variadic: false,
            },
            TuplePatElt {
                pattern: named("rest"),
                label: None,
                variadic: true,
            },
        ]));

        let mut cs = ConstraintSystem::new();
        let ty = ty_for_pattern(&pat, false, None, &mut cs);
        let elts = match ty {
            Ty::Tuple(elts) => elts,
            ty => panic!("expected a tuple type, found {}", ty),
        };

        assert_eq!(elts.len(), 3);
        assert_eq!(elts[0].label.as_deref(), Some("first"));
        assert!(!elts[0].variadic);
        assert_eq!(elts[1].label, None);
        assert!(elts[2].variadic);
        assert_eq!(cs.num_vars(), 3);
    }

    #[test]
    fn test_wrappers_are_transparent() {
        let pat = Node::new(Pattern::Binding(Box::new(Node::new(Pattern::Paren(
            Box::new(named("x")),
        )))));

        let mut cs = ConstraintSystem::new();
        let ty = ty_for_pattern(&pat, false, None, &mut cs);
        assert!(ty.is_var());
        assert_eq!(cs.num_vars(), 1);
    }

    #[test]
    fn test_typed_leaf_opens_declared_ty() {
        let pat = Node::new(Pattern::Typed {
            pattern: Box::new(named("f")),
            ty: TyScheme::new(
                vec![TyVar(0)],
                Ty::func(vec![Ty::Var(TyVar(0))], Ty::Var(TyVar(0))),
            ),
        });

        let mut cs = ConstraintSystem::new();
        let ty = ty_for_pattern(&pat, false, None, &mut cs);
        // the quantified variable is replaced with a store variable
        assert_eq!(cs.num_vars(), 1);
        let opened = Ty::func(vec![Ty::Var(TyVar(0))], Ty::Var(TyVar(0)));
        assert_eq!(ty, opened);
    }

    #[test]
    fn test_collection_binding_reuses_container_ty() {
        // a name bound straight to an already-typed literal collection gets
        // the collection's type, no matter how deeply it nests
        for depth in 1..6 {
            let mut inner = Node::new(Expr::Array(vec![]));
            let mut ty = Ty::list(Ty::int());
            for _ in 1..depth {
                inner = Node::new(Expr::Array(vec![inner]));
                ty = Ty::list(ty);
            }

            let mut cs = ConstraintSystem::new();
            cs.set_ty(inner.id, ty.clone());

            let pat = named("xs");
            let derived = ty_for_pattern(&pat, false, Some(&inner), &mut cs);
            assert_eq!(derived, ty);
            assert_eq!(cs.num_vars(), 0);
        }
    }

    #[test]
    fn test_refutable_leaf_gets_unconstrained_var() {
        let mut cs = ConstraintSystem::new();
        let ty = ty_for_pattern(&Node::new(Pattern::Refutable), true, None, &mut cs);
        assert!(ty.is_var());
        assert_eq!(cs.num_vars(), 1);
    }
}
