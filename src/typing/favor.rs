use itertools::Itertools;

use crate::{
    ast::{ApplyStyle, Expr, Node},
    typing::{
        constraint::{Constraint, ConstraintKind, OverloadChoice},
        decls::{DeclId, DeclTable},
        linked::optimize_linked_exprs,
        store::ConstraintSystem,
        ty::{TupleElt, Ty},
    },
};

/// The post-generation optimization pass: linked-chain favoring first, then
/// overload favoring over every application node.
pub fn optimize_constraints(root: &Node<Expr>, cs: &mut ConstraintSystem, decls: &DeclTable) {
    optimize_linked_exprs(root, cs, decls);
    walk(root, cs, decls);
}

fn walk(node: &Node<Expr>, cs: &mut ConstraintSystem, decls: &DeclTable) {
    match &node.value {
        Expr::Paren(inner) => {
            // a paren and its sub-expression share favored types in whichever
            // direction is missing
            match (
                cs.favored_ty(node.id).cloned(),
                cs.favored_ty(inner.id).cloned(),
            ) {
                (Some(ty), None) => cs.set_favored_ty(inner.id, ty),
                (None, Some(ty)) => cs.set_favored_ty(node.id, ty),
                _ => {}
            }
        }
        Expr::Apply { callee, arg, style } => match style {
            ApplyStyle::Binary => favor_matching_binary(node, callee, arg, cs, decls),
            ApplyStyle::Prefix | ApplyStyle::Postfix => {
                favor_matching_unary(node, callee, arg, cs, decls)
            }
            ApplyStyle::Call => favor_matching_call(node, callee, arg, cs, decls),
        },
        _ => {}
    }

    node.value.each_child(&mut |child| walk(child, cs, decls));
}

/// Whether an argument satisfies a parameter exactly enough to favor the
/// overload without solving. An unbound literal variable counts against the
/// other operand's concrete type when there is one, and only otherwise
/// against its capability's default type.
fn is_favored_param_and_arg(
    cs: &ConstraintSystem,
    decls: &DeclTable,
    param: &Ty,
    arg_ty: &Ty,
    other_arg_ty: Option<&Ty>,
) -> bool {
    if param == arg_ty {
        return true;
    }

    let tv = match arg_ty.get_var() {
        Some(tv) => tv,
        _ => return false,
    };
    let cap = match cs.literal_capability(tv) {
        Some(cap) => cap,
        _ => return false,
    };

    // a concrete operand on the other side is authoritative: the parameter
    // must be that type, and it must adopt the literal's capability
    if let Some(other) = other_arg_ty {
        if other.nominal_name().is_some() {
            return other == param && decls.conforms_to(param, cap);
        }
    }

    decls
        .default_ty(cap)
        .map(|ty| &ty == param)
        .unwrap_or(false)
}

fn mono_fn_parts<'a>(decls: &'a DeclTable, decl: DeclId) -> Option<(&'a Vec<Ty>, &'a Ty)> {
    decls.declared_ty(decl)?.mono()?.func_parts()
}

fn binary_operands<'a>(arg: &'a Node<Expr>) -> Option<(&'a Node<Expr>, &'a Node<Expr>)> {
    match &arg.value {
        Expr::Tuple(elts) if elts.len() == 2 => Some((&elts[0].expr, &elts[1].expr)),
        Expr::Paren(inner) => binary_operands(inner),
        _ => None,
    }
}

fn favor_matching_binary(
    node: &Node<Expr>,
    callee: &Node<Expr>,
    arg: &Node<Expr>,
    cs: &mut ConstraintSystem,
    decls: &DeclTable,
) {
    let (lhs, rhs) = unless!(binary_operands(arg));
    let lhs_ty = unless!(cs.ty(lhs.id)).clone();
    let rhs_ty = unless!(cs.ty(rhs.id)).clone();
    let callee_ty = unless!(cs.ty(callee.id)).clone();

    // operands inherit the application's favored type when they have none
    if let Some(fav) = cs.favored_ty(node.id).cloned() {
        for operand in [lhs, rhs].iter() {
            if cs.favored_ty(operand.id).is_none() {
                cs.set_favored_ty(operand.id, fav.clone());
            }
        }
    }

    // candidates are matched against the favored operand types when those
    // exist, so chain evidence can decide between overloads
    let lhs_fav = cs.favored_ty(lhs.id).cloned().unwrap_or_else(|| lhs_ty.clone());
    let rhs_fav = cs.favored_ty(rhs.id).cloned().unwrap_or_else(|| rhs_ty.clone());

    let contextual = cs.contextual_ty(node.id).cloned();
    let replacements = equality_replacements(cs, decls, &callee_ty, &lhs_ty, &rhs_ty, callee);

    favor_call_overloads(
        cs,
        decls,
        node.id,
        &callee_ty,
        |cs, choice| {
            let (params, result) = match mono_fn_parts(decls, choice.decl) {
                Some(parts) => parts,
                _ => return false,
            };
            if params.len() != 2 {
                return false;
            }

            // a homogeneous signature is favored when either operand pins it
            params[0] == params[1]
                && (is_favored_param_and_arg(cs, decls, &params[0], &lhs_fav, Some(&rhs_fav))
                    || is_favored_param_and_arg(cs, decls, &params[1], &rhs_fav, Some(&lhs_fav)))
                && contextual.as_ref().map(|ty| ty == result).unwrap_or(true)
        },
        None,
        replacements,
    );
}

fn favor_matching_unary(
    node: &Node<Expr>,
    callee: &Node<Expr>,
    arg: &Node<Expr>,
    cs: &mut ConstraintSystem,
    decls: &DeclTable,
) {
    let arg_ty = unless!(cs.ty(arg.id)).clone();
    let arg_ty = cs.favored_ty(arg.id).cloned().unwrap_or(arg_ty);
    let callee_ty = unless!(cs.ty(callee.id)).clone();
    let contextual = cs.contextual_ty(node.id).cloned();

    favor_call_overloads(
        cs,
        decls,
        node.id,
        &callee_ty,
        |cs, choice| {
            let (params, result) = match mono_fn_parts(decls, choice.decl) {
                Some(parts) => parts,
                _ => return false,
            };
            if params.len() != 1 {
                return false;
            }

            is_favored_param_and_arg(cs, decls, &params[0], &arg_ty, None)
                && contextual.as_ref().map(|ty| ty == result).unwrap_or(true)
        },
        None,
        None,
    );
}

/// General calls favor in two phases: first by arity, when exactly one
/// candidate's signature admits the argument count, then by the argument's
/// favored type matching a candidate's parameter list exactly. Only the
/// second phase honors the protocol-requirement exemption.
fn favor_matching_call(
    node: &Node<Expr>,
    callee: &Node<Expr>,
    arg: &Node<Expr>,
    cs: &mut ConstraintSystem,
    decls: &DeclTable,
) {
    let candidates = match &callee.value {
        Expr::OverloadedName { decls: ids, .. } => ids.clone(),
        Expr::OverloadedMember { decls: ids, .. } => ids.clone(),
        _ => return,
    };
    let callee_ty = unless!(cs.ty(callee.id)).clone();

    let num_args = match &arg.value {
        Expr::Tuple(elts) => elts.len(),
        _ => 1,
    };

    let arity_matches = |decl: DeclId| -> bool {
        match decls.get(decl).and_then(|d| d.param_counts()) {
            Some((required, total)) => required <= num_args && num_args <= total,
            _ => false,
        }
    };

    let matching = candidates
        .iter()
        .filter(|&&decl| arity_matches(decl))
        .count();
    if matching == 1 {
        favor_call_overloads(
            cs,
            decls,
            node.id,
            &callee_ty,
            |_, choice| arity_matches(choice.decl),
            None,
            None,
        );
    } else {
        log::debug!(
            "no arity favoring at {:x}: {} candidates match arity {}",
            node.id,
            matching,
            num_args
        );
    }

    let fav_arg = unless!(cs.favored_ty(arg.id)).clone();
    let must_consider = |decl: DeclId| -> bool {
        decls.get(decl).map(|d| d.is_requirement).unwrap_or(false)
    };

    favor_call_overloads(
        cs,
        decls,
        node.id,
        &callee_ty,
        |_, choice| {
            let (params, _) = match mono_fn_parts(decls, choice.decl) {
                Some(parts) => parts,
                _ => return false,
            };
            params_ty(params) == fav_arg
        },
        Some(&must_consider),
        None,
    );
}

/// A candidate's parameter list viewed as one type, for comparison against a
/// favored argument type.
fn params_ty(params: &[Ty]) -> Ty {
    if params.len() == 1 {
        params[0].clone()
    } else {
        Ty::Tuple(params.iter().cloned().map(TupleElt::from).collect())
    }
}

/// Synthesized replacement list for binary `==` over nominals whose equality
/// is compiler-derived: the user-visible choices plus one derived witness per
/// distinct operand nominal type.
fn equality_replacements(
    cs: &ConstraintSystem,
    decls: &DeclTable,
    callee_ty: &Ty,
    lhs_ty: &Ty,
    rhs_ty: &Ty,
    callee: &Node<Expr>,
) -> Option<Vec<Constraint>> {
    match &callee.value {
        Expr::OverloadedName { name, .. } if name == "==" => {}
        _ => return None,
    }

    let tv = callee_ty.get_var()?;
    let disj = cs
        .gather_constraints(tv)
        .into_iter()
        .find(|c| c.overload_choices().is_some())?;
    let choices = disj.overload_choices()?;
    let bound_ty = match &choices[0].kind {
        ConstraintKind::BindOverload(ty, _) => ty.clone(),
        _ => return None,
    };

    let resolved = [lhs_ty, rhs_ty]
        .iter()
        .map(|ty| match ty.get_var().and_then(|tv| cs.literal_capability(tv)) {
            Some(cap) => decls.default_ty(cap),
            _ => Some((*ty).clone()),
        })
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .unique();

    let mut synthesized = vec![];
    for ty in resolved {
        if decls.derives_equatable(&ty) {
            if let Some(witness) = decls.equality_witness(&ty) {
                synthesized.push(Constraint::new(
                    ConstraintKind::BindOverload(bound_ty.clone(), OverloadChoice::new(witness)),
                    disj.locator.clone(),
                ));
            }
        }
    }

    if synthesized.is_empty() {
        return None;
    }

    let mut replacements = choices.iter().map(|c| c.cloned()).collect::<Vec<_>>();
    replacements.extend(synthesized);
    Some(replacements)
}

/// Rewrite the overload disjunction attached to a callee into a favored-tier
/// plus fallback-tier structure, so the solver attempts the favored choices
/// first. Leaves the constraint untouched when nothing is favored and no
/// replacement list was supplied.
pub fn favor_call_overloads<F>(
    cs: &mut ConstraintSystem,
    decls: &DeclTable,
    node_id: u64,
    callee_ty: &Ty,
    is_favored: F,
    must_consider: Option<&dyn Fn(DeclId) -> bool>,
    replacements: Option<Vec<Constraint>>,
) where
    F: Fn(&ConstraintSystem, &OverloadChoice) -> bool,
{
    let tv = unless!(callee_ty.get_var());
    let disj = unless!(cs
        .gather_constraints(tv)
        .into_iter()
        .find(|c| c.overload_choices().is_some()));
    let disj_id = disj.id;
    let locator = disj.locator.clone();
    let choices = disj
        .overload_choices()
        .map(|cs| cs.iter().map(|c| c.cloned()).collect::<Vec<_>>())
        .unwrap_or_default();

    // a protocol's own requirement must stay in play alongside overrides, so
    // the whole disjunction is exempt from favoring
    let skip = match must_consider {
        Some(mc) => choices
            .iter()
            .filter_map(|c| c.bind_overload_choice())
            .any(|choice| mc(choice.decl)),
        _ => false,
    };

    let favored = if skip {
        vec![]
    } else {
        choices
            .iter()
            .filter(|c| {
                c.bind_overload_choice()
                    .map(|choice| is_favored(cs, choice))
                    .unwrap_or(false)
            })
            .map(|c| c.cloned().favored())
            .collect::<Vec<_>>()
    };

    if favored.len() == 1 {
        if let Some(choice) = favored[0].bind_overload_choice() {
            if let Some((_, result)) = mono_fn_parts(decls, choice.decl) {
                log::debug!("favoring overload decl#{} at {:x}", choice.decl, node_id);
                cs.set_favored_ty(node_id, result.clone());
            }
        }
    }

    let fallback = replacements.clone().unwrap_or_else(|| choices.clone());

    if !favored.is_empty() {
        let favored_tier =
            Constraint::new(ConstraintKind::Disjunction(favored), locator.clone()).favored();
        let fallback_tier = Constraint::new(ConstraintKind::Disjunction(fallback), locator.clone());
        let two_tier = Constraint::new(
            ConstraintKind::Disjunction(vec![favored_tier, fallback_tier]),
            locator,
        );
        cs.replace_constraint(disj_id, two_tier);
    } else if let Some(replacements) = replacements {
        let rebuilt = Constraint::new(ConstraintKind::Disjunction(replacements), locator);
        cs.replace_constraint(disj_id, rebuilt);
    }
}

#[cfg(test)]
mod favor_tests {
    use super::*;
    use crate::{
        ast::{Literal, TupleExprElt},
        typing::{
            constraint::Locator,
            decls::{DeclInfo, NominalInfo},
            ty::{Capability, TyVarOptions},
        },
    };

    struct Setup {
        decls: DeclTable,
        cs: ConstraintSystem,
    }

    fn overloaded_binary(
        name: &str,
        sigs: Vec<Ty>,
        lhs: Node<Expr>,
        rhs: Node<Expr>,
    ) -> (Setup, Node<Expr>, crate::typing::ty::TyVar) {
        let mut decls = DeclTable::new();
        let mut cs = ConstraintSystem::new();

        let ids = sigs
            .into_iter()
            .map(|ty| decls.define(DeclInfo::new(name, ty)).unwrap())
            .collect::<Vec<_>>();

        let callee = Node::new(Expr::OverloadedName {
            name: str!(name),
            decls: ids.clone(),
            specialized: false,
        });
        let tv = cs.fresh_var(TyVarOptions::default(), Locator::new(callee.id));
        cs.set_ty(callee.id, Ty::Var(tv));

        let alts = ids
            .iter()
            .map(|&id| {
                Constraint::new(
                    ConstraintKind::BindOverload(Ty::Var(tv), OverloadChoice::new(id)),
                    Locator::new(callee.id),
                )
            })
            .collect::<Vec<_>>();
        cs.push(Constraint::new(
            ConstraintKind::Disjunction(alts),
            Locator::new(callee.id),
        ));

        let arg = Node::new(Expr::Tuple(vec![
            TupleExprElt::from(lhs),
            TupleExprElt::from(rhs),
        ]));
        let apply = Node::new(Expr::Apply {
            callee: Box::new(callee),
            arg: Box::new(arg),
            style: ApplyStyle::Binary,
        });

        (Setup { decls, cs }, apply, tv)
    }

    fn operands(apply: &Node<Expr>) -> (u64, u64) {
        match &apply.value {
            Expr::Apply { arg, .. } => match &arg.value {
                Expr::Tuple(elts) => (elts[0].expr.id, elts[1].expr.id),
                _ => panic!("expected a tuple argument"),
            },
            _ => panic!("expected an application"),
        }
    }

    #[test]
    fn test_exact_match_favoring() {
        let lhs = Node::new(Expr::Literal(Literal::Int(1)));
        let rhs = Node::new(Expr::Discard);
        let (mut setup, apply, tv) = overloaded_binary(
            "+",
            vec![
                Ty::func(vec![Ty::int(), Ty::int()], Ty::int()),
                Ty::func(vec![Ty::float(), Ty::float()], Ty::float()),
            ],
            lhs,
            rhs,
        );

        let (lhs_id, rhs_id) = operands(&apply);
        setup.cs.set_ty(lhs_id, Ty::float());
        setup.cs.set_ty(rhs_id, Ty::float());

        walk(&apply, &mut setup.cs, &setup.decls);

        // exactly one favored tier, containing the float overload
        assert_eq!(setup.cs.favored_ty(apply.id), Some(&Ty::float()));
        let found = setup.cs.gather_constraints(tv);
        assert_eq!(found.len(), 1);
        let tiers = variant!(&found[0].kind, if ConstraintKind::Disjunction(tiers));
        assert_eq!(tiers.len(), 2);
        assert!(tiers[0].favored);
        let favored = variant!(&tiers[0].kind, if ConstraintKind::Disjunction(alts));
        assert_eq!(favored.len(), 1);
        let fallback = variant!(&tiers[1].kind, if ConstraintKind::Disjunction(alts));
        assert_eq!(fallback.len(), 2);
    }

    #[test]
    fn test_literal_operand_matches_via_default() {
        // 1 + 1.0: the int literal is as good as an exact match for the
        // float overload because float adopts the integer-literal capability
        let lhs = Node::new(Expr::Literal(Literal::Int(1)));
        let rhs = Node::new(Expr::Literal(Literal::Float(1.0)));
        let (mut setup, apply, tv) = overloaded_binary(
            "+",
            vec![
                Ty::func(vec![Ty::int(), Ty::int()], Ty::int()),
                Ty::func(vec![Ty::float(), Ty::float()], Ty::float()),
            ],
            lhs,
            rhs,
        );

        let (lhs_id, rhs_id) = operands(&apply);
        let lit = setup
            .cs
            .fresh_literal_var(Capability::IntegerLiteral, Locator::new(lhs_id));
        setup.cs.set_ty(lhs_id, Ty::Var(lit));
        setup.cs.set_ty(rhs_id, Ty::float());

        walk(&apply, &mut setup.cs, &setup.decls);

        assert_eq!(setup.cs.favored_ty(apply.id), Some(&Ty::float()));
        let found = setup.cs.gather_constraints(tv);
        let tiers = variant!(&found[0].kind, if ConstraintKind::Disjunction(tiers));
        assert!(tiers[0].favored);
    }

    #[test]
    fn test_single_matching_operand_suffices() {
        // x + y with x: int and y unresolved still favors the homogeneous
        // int signature off the one pinned operand
        let lhs = Node::new(Expr::Literal(Literal::Int(1)));
        let rhs = Node::new(Expr::Discard);
        let (mut setup, apply, tv) = overloaded_binary(
            "+",
            vec![Ty::func(vec![Ty::int(), Ty::int()], Ty::int())],
            lhs,
            rhs,
        );

        let (lhs_id, rhs_id) = operands(&apply);
        let plain = setup
            .cs
            .fresh_var(TyVarOptions::default(), Locator::new(rhs_id));
        setup.cs.set_ty(lhs_id, Ty::int());
        setup.cs.set_ty(rhs_id, Ty::Var(plain));

        walk(&apply, &mut setup.cs, &setup.decls);

        assert_eq!(setup.cs.favored_ty(apply.id), Some(&Ty::int()));
        let found = setup.cs.gather_constraints(tv);
        let tiers = variant!(&found[0].kind, if ConstraintKind::Disjunction(tiers));
        assert!(tiers[0].favored);
    }

    #[test]
    fn test_unequal_params_are_not_favored() {
        // a heterogeneous signature is never favored, even when both
        // operands match their parameters exactly
        let lhs = Node::new(Expr::Discard);
        let rhs = Node::new(Expr::Discard);
        let (mut setup, apply, tv) = overloaded_binary(
            "+",
            vec![Ty::func(vec![Ty::int(), Ty::string()], Ty::int())],
            lhs,
            rhs,
        );

        let (lhs_id, rhs_id) = operands(&apply);
        setup.cs.set_ty(lhs_id, Ty::int());
        setup.cs.set_ty(rhs_id, Ty::string());

        walk(&apply, &mut setup.cs, &setup.decls);

        assert_eq!(setup.cs.favored_ty(apply.id), None);
        let found = setup.cs.gather_constraints(tv);
        assert!(found[0].overload_choices().is_some());
    }

    #[test]
    fn test_concrete_mismatched_operand_blocks_literal_default() {
        // 1 + "s": the other operand is a concrete nominal that is not the
        // parameter type, so the int literal does not fall back to its
        // default type
        let lhs = Node::new(Expr::Literal(Literal::Int(1)));
        let rhs = Node::new(Expr::Literal(Literal::Str(str!("s"))));
        let (mut setup, apply, tv) = overloaded_binary(
            "+",
            vec![Ty::func(vec![Ty::int(), Ty::int()], Ty::int())],
            lhs,
            rhs,
        );

        let (lhs_id, rhs_id) = operands(&apply);
        let lit = setup
            .cs
            .fresh_literal_var(Capability::IntegerLiteral, Locator::new(lhs_id));
        setup.cs.set_ty(lhs_id, Ty::Var(lit));
        setup.cs.set_ty(rhs_id, Ty::string());

        walk(&apply, &mut setup.cs, &setup.decls);

        assert_eq!(setup.cs.favored_ty(apply.id), None);
        let found = setup.cs.gather_constraints(tv);
        assert!(found[0].overload_choices().is_some());
    }

    #[test]
    fn test_contextual_mismatch_blocks_favoring() {
        let lhs = Node::new(Expr::Discard);
        let rhs = Node::new(Expr::Discard);
        let (mut setup, apply, tv) = overloaded_binary(
            "+",
            vec![Ty::func(vec![Ty::int(), Ty::int()], Ty::int())],
            lhs,
            rhs,
        );

        let (lhs_id, rhs_id) = operands(&apply);
        setup.cs.set_ty(lhs_id, Ty::int());
        setup.cs.set_ty(rhs_id, Ty::int());
        setup.cs.set_contextual_ty(apply.id, Ty::string());

        walk(&apply, &mut setup.cs, &setup.decls);

        // result type disagrees with the context, so nothing is favored
        assert_eq!(setup.cs.favored_ty(apply.id), None);
        let found = setup.cs.gather_constraints(tv);
        assert!(found[0].overload_choices().is_some());
    }

    #[test]
    fn test_ambiguous_arity_is_not_favored() {
        let mut decls = DeclTable::new();
        let mut cs = ConstraintSystem::new();

        let (apply, _, _, disj_id) = overloaded_call(
            vec![
                DeclInfo::new("describe", Ty::func(vec![Ty::int()], Ty::int())),
                DeclInfo::new("describe", Ty::func(vec![Ty::string()], Ty::string())),
            ],
            &mut decls,
            &mut cs,
        );

        walk(&apply, &mut cs, &decls);

        // both candidates take one argument and no argument type is favored,
        // so the disjunction is untouched
        assert_eq!(cs.favored_ty(apply.id), None);
        assert!(cs.get_constraint(disj_id).is_some());
    }

    fn overloaded_call(
        sigs: Vec<DeclInfo>,
        decls: &mut DeclTable,
        cs: &mut ConstraintSystem,
    ) -> (Node<Expr>, u64, crate::typing::ty::TyVar, u64) {
        let ids = sigs
            .into_iter()
            .map(|info| decls.define(info).unwrap())
            .collect::<Vec<_>>();

        let callee = Node::new(Expr::OverloadedName {
            name: str!("describe"),
            decls: ids.clone(),
            specialized: false,
        });
        let tv = cs.fresh_var(TyVarOptions::default(), Locator::new(callee.id));
        cs.set_ty(callee.id, Ty::Var(tv));
        let alts = ids
            .into_iter()
            .map(|id| {
                Constraint::new(
                    ConstraintKind::BindOverload(Ty::Var(tv), OverloadChoice::new(id)),
                    Locator::new(callee.id),
                )
            })
            .collect::<Vec<_>>();
        let disj_id = {
            let disj = Constraint::new(ConstraintKind::Disjunction(alts), Locator::new(callee.id));
            let id = disj.id;
            cs.push(disj);
            id
        };

        let arg = Node::new(Expr::Tuple(vec![TupleExprElt::from(Node::new(
            Expr::Literal(Literal::Int(3)),
        ))]));
        let arg_id = arg.id;
        let apply = Node::new(Expr::Apply {
            callee: Box::new(callee),
            arg: Box::new(arg),
            style: ApplyStyle::Call,
        });

        (apply, arg_id, tv, disj_id)
    }

    #[test]
    fn test_favored_argument_selects_matching_call_overload() {
        let mut decls = DeclTable::new();
        let mut cs = ConstraintSystem::new();

        // same arity, so only the favored argument type can discriminate
        let (apply, arg_id, tv, _) = overloaded_call(
            vec![
                DeclInfo::new("describe", Ty::func(vec![Ty::int()], Ty::string())),
                DeclInfo::new("describe", Ty::func(vec![Ty::string()], Ty::string())),
            ],
            &mut decls,
            &mut cs,
        );
        cs.set_favored_ty(arg_id, Ty::int());

        walk(&apply, &mut cs, &decls);

        assert_eq!(cs.favored_ty(apply.id), Some(&Ty::string()));
        let found = cs.gather_constraints(tv);
        let tiers = variant!(&found[0].kind, if ConstraintKind::Disjunction(tiers));
        assert_eq!(tiers.len(), 2);
        assert!(tiers[0].favored);
        let favored = variant!(&tiers[0].kind, if ConstraintKind::Disjunction(alts));
        assert_eq!(favored.len(), 1);
    }

    #[test]
    fn test_requirement_candidate_skips_favoring() {
        let mut decls = DeclTable::new();
        let mut cs = ConstraintSystem::new();

        let (apply, arg_id, _, disj_id) = overloaded_call(
            vec![
                DeclInfo::new("describe", Ty::func(vec![Ty::int()], Ty::string())),
                DeclInfo::new("describe", Ty::func(vec![Ty::string()], Ty::string()))
                    .requirement(),
            ],
            &mut decls,
            &mut cs,
        );
        cs.set_favored_ty(arg_id, Ty::int());

        walk(&apply, &mut cs, &decls);

        // the favored argument type matches the first candidate, but a
        // requirement is present, so the disjunction stays untouched
        assert_eq!(cs.favored_ty(apply.id), None);
        assert!(cs.get_constraint(disj_id).is_some());
    }

    #[test]
    fn test_derived_equality_injection() {
        let lhs = Node::new(Expr::Discard);
        let rhs = Node::new(Expr::Discard);
        let (mut setup, apply, tv) = overloaded_binary(
            "==",
            vec![Ty::func(vec![Ty::int(), Ty::int()], Ty::bool())],
            lhs,
            rhs,
        );

        let witness = setup
            .decls
            .define(DeclInfo::new(
                "==",
                Ty::func(
                    vec![Ty::Const(str!("point")), Ty::Const(str!("point"))],
                    Ty::bool(),
                ),
            ))
            .unwrap();
        let mut info = NominalInfo::new();
        info.derives_equatable = true;
        info.eq_witness = Some(witness);
        setup.decls.add_nominal("point", info);

        let (lhs_id, rhs_id) = operands(&apply);
        setup.cs.set_ty(lhs_id, Ty::Const(str!("point")));
        setup.cs.set_ty(rhs_id, Ty::Const(str!("point")));

        walk(&apply, &mut setup.cs, &setup.decls);

        // no candidate is favored for nominal operands, so the disjunction
        // is rebuilt flat with the derived witness appended and nothing is
        // recorded as favored
        assert_eq!(setup.cs.favored_ty(apply.id), None);
        let found = setup.cs.gather_constraints(tv);
        assert_eq!(found.len(), 1);
        assert!(!found[0].favored);
        let alts = variant!(&found[0].kind, if ConstraintKind::Disjunction(alts));
        assert_eq!(alts.len(), 2);
        assert!(alts.iter().all(|c| c.bind_overload_choice().is_some()));
        assert_eq!(alts[1].bind_overload_choice().unwrap().decl, witness);
    }

    #[test]
    fn test_paren_shares_favored_ty() {
        let inner = Node::new(Expr::Literal(Literal::Int(1)));
        let inner_id = inner.id;
        let paren = Node::new(Expr::Paren(Box::new(inner)));

        let mut cs = ConstraintSystem::new();
        let decls = DeclTable::new();
        cs.set_favored_ty(paren.id, Ty::int());

        walk(&paren, &mut cs, &decls);
        assert_eq!(cs.favored_ty(inner_id), Some(&Ty::int()));
    }
}
