use crate::{
    ast::{Expr, Node},
    typing::{
        constraint::{ConstraintKind, Locator, LocatorElt, OverloadChoice},
        decls::DeclId,
        store::ConstraintSystem,
        ty::{Ty, TyVarOptions},
    },
};

/// Constraints for a named member access. An unresolved member becomes a
/// `ValueMember` lookup; a known declaration is bound as an overload of one.
pub fn member_ref_constraints(
    cs: &mut ConstraintSystem,
    node_id: u64,
    base_ty: Ty,
    name: &str,
    decl: Option<DeclId>,
) -> Ty {
    let loc = Locator::new(node_id).with(LocatorElt::Member(str!(name)));
    let tv = cs.fresh_var(TyVarOptions::CAN_BIND_TO_LVALUE, loc.clone());

    match decl {
        Some(decl) => {
            cs.add(
                ConstraintKind::BindOverload(
                    Ty::Var(tv),
                    OverloadChoice::new(decl).with_base(base_ty),
                ),
                loc,
            );
        }
        _ => {
            cs.add(
                ConstraintKind::ValueMember(base_ty, str!(name), Ty::Var(tv)),
                loc,
            );
        }
    }

    Ty::Var(tv)
}

/// Constraints for an indexing expression. When the base's container shape
/// and the index pin the result down, the result type is set directly and
/// recorded as the node's favored type; no result variable is minted.
pub fn subscript_constraints(
    cs: &mut ConstraintSystem,
    node_id: u64,
    base: &Node<Expr>,
    index: &Node<Expr>,
    decl: Option<DeclId>,
) -> Option<Ty> {
    let base_ty = cs.ty(base.id)?.clone();
    let index_ty = cs.ty(index.id)?.clone();
    let loc = Locator::new(node_id);

    let mut out_ty = None;
    if let Some(elt) = base_ty.list_element_ty() {
        if index.value.is_integer_literal() {
            let ty = if base_ty.is_lvalue() {
                Ty::lvalue(elt.clone())
            } else {
                elt.clone()
            };
            log::debug!("subscript fast path: list element {}", ty);
            cs.set_favored_ty(node_id, ty.clone());
            out_ty = Some(ty);
        }
    } else if let Some((key, value)) = base_ty.map_entry_tys() {
        if &index_ty == key {
            let ty = Ty::optional(value.clone());
            log::debug!("subscript fast path: map value {}", ty);
            cs.set_favored_ty(node_id, ty.clone());
            out_ty = Some(ty);
        }
    }

    let input = cs.fresh_var(
        TyVarOptions::default(),
        loc.clone().with(LocatorElt::SubscriptIndex),
    );
    let out_ty = match out_ty {
        Some(ty) => ty,
        _ => Ty::Var(cs.fresh_var(
            TyVarOptions::CAN_BIND_TO_LVALUE,
            loc.clone().with(LocatorElt::SubscriptResult),
        )),
    };

    let fn_ty = Ty::func(vec![Ty::Var(input)], out_ty.clone());
    match decl {
        Some(decl) => {
            cs.add(
                ConstraintKind::BindOverload(
                    fn_ty,
                    OverloadChoice::new(decl).with_base(base_ty),
                ),
                loc.clone().with(LocatorElt::Member(str!("subscript"))),
            );
        }
        _ => {
            cs.add(
                ConstraintKind::ValueMember(base_ty, str!("subscript"), fn_ty),
                loc.clone().with(LocatorElt::Member(str!("subscript"))),
            );
        }
    }

    cs.add(
        ConstraintKind::ArgConversion(index_ty, Ty::Var(input)),
        loc.with(LocatorElt::SubscriptIndex),
    );

    Some(out_ty)
}

#[cfg(test)]
mod member_tests {
    use super::*;
    use crate::ast::Literal;

    fn typed_node(cs: &mut ConstraintSystem, expr: Expr, ty: Ty) -> Node<Expr> {
        let node = Node::new(expr);
        cs.set_ty(node.id, ty);
        node
    }

    #[test]
    fn test_unresolved_member_emits_value_member() {
        let mut cs = ConstraintSystem::new();
        let ty = member_ref_constraints(&mut cs, 7, Ty::string(), "count", None);
        assert!(ty.is_var());

        let tv = ty.get_var().unwrap();
        assert!(cs.var_options(tv).contains(TyVarOptions::CAN_BIND_TO_LVALUE));

        let found = cs.gather_constraints(tv);
        assert_eq!(found.len(), 1);
        assert!(matches!(
            &found[0].kind,
            ConstraintKind::ValueMember(base, name, _) if base == &Ty::string() && name == "count"
        ));
    }

    #[test]
    fn test_list_subscript_fast_path() {
        let mut cs = ConstraintSystem::new();
        let base = typed_node(&mut cs, Expr::Discard, Ty::list(Ty::string()));
        let index = typed_node(&mut cs, Expr::Literal(Literal::Int(0)), Ty::int());

        let before = cs.num_vars();
        let out = subscript_constraints(&mut cs, 11, &base, &index, None).unwrap();
        assert_eq!(out, Ty::string());
        assert_eq!(cs.favored_ty(11), Some(&Ty::string()));
        // only the index variable was minted
        assert_eq!(cs.num_vars(), before + 1);
    }

    #[test]
    fn test_lvalue_list_subscript_wraps_result() {
        let mut cs = ConstraintSystem::new();
        let base = typed_node(&mut cs, Expr::Discard, Ty::lvalue(Ty::list(Ty::int())));
        let index = typed_node(&mut cs, Expr::Literal(Literal::Int(2)), Ty::int());

        let out = subscript_constraints(&mut cs, 12, &base, &index, None).unwrap();
        assert_eq!(out, Ty::lvalue(Ty::int()));
    }

    #[test]
    fn test_map_subscript_fast_path_needs_exact_key() {
        let mut cs = ConstraintSystem::new();
        let base = typed_node(&mut cs, Expr::Discard, Ty::map(Ty::string(), Ty::int()));
        let index = typed_node(&mut cs, Expr::Literal(Literal::Str(str!("k"))), Ty::string());

        let before = cs.num_vars();
        let out = subscript_constraints(&mut cs, 13, &base, &index, None).unwrap();
        assert_eq!(out, Ty::optional(Ty::int()));
        assert_eq!(cs.num_vars(), before + 1);

        // key mismatch falls back to minting a result variable
        let mut cs = ConstraintSystem::new();
        let base = typed_node(&mut cs, Expr::Discard, Ty::map(Ty::string(), Ty::int()));
        let index = typed_node(&mut cs, Expr::Literal(Literal::Int(0)), Ty::int());

        let before = cs.num_vars();
        let out = subscript_constraints(&mut cs, 14, &base, &index, None).unwrap();
        assert!(out.is_var());
        assert_eq!(cs.num_vars(), before + 2);
        assert_eq!(cs.favored_ty(14), None);
    }

    #[test]
    fn test_subscript_emits_arg_conversion() {
        let mut cs = ConstraintSystem::new();
        let base = typed_node(&mut cs, Expr::Discard, Ty::Var(tvar!(100)));
        let index = typed_node(&mut cs, Expr::Literal(Literal::Int(0)), Ty::Var(tvar!(101)));

        subscript_constraints(&mut cs, 15, &base, &index, None).unwrap();
        let has_arg_conv = cs
            .constraints()
            .any(|c| matches!(&c.kind, ConstraintKind::ArgConversion(..)));
        assert!(has_arg_conv);
    }
}
