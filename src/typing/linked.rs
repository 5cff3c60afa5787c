use crate::{
    ast::{ApplyStyle, Expr, Literal, Node},
    typing::{decls::DeclTable, store::ConstraintSystem, ty::Capability, ty::Ty},
};

/// Type evidence accumulated over one literal/operator chain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkedTypeInfo {
    pub have_int_literal: bool,
    pub have_float_literal: bool,
    pub have_string_literal: bool,
    /// Concrete types harvested from non-literal sub-evidence, in visit
    /// order. Resolution uses the first entry, not a join of all of them.
    pub collected: Vec<Ty>,
}

/// Collect the roots of every chain in the tree: top-level literal nodes and
/// binary applications not nested inside another such node. Descent stops at
/// the first match.
pub fn collect_chains<'a>(root: &'a Node<Expr>, out: &mut Vec<&'a Node<Expr>>) {
    match &root.value {
        Expr::Literal(Literal::Int(_))
        | Expr::Literal(Literal::Float(_))
        | Expr::Literal(Literal::Str(_)) => out.push(root),
        Expr::Apply {
            style: ApplyStyle::Binary,
            ..
        } => out.push(root),
        // a closure body is its own generation scope
        Expr::Closure { .. } => {}
        value => value.each_child(&mut |child| collect_chains(child, out)),
    }
}

/// Walk a chain's interior and accumulate its `LinkedTypeInfo`. Operator
/// applications (binary and unary) are traversed; descent stops at calls,
/// which contribute an already-pinned result type, at member accesses, which
/// contribute an already-concrete type, and at any node whose favored type is
/// already known.
pub fn analyze_chain(root: &Node<Expr>, cs: &ConstraintSystem) -> LinkedTypeInfo {
    let mut info = LinkedTypeInfo::default();
    analyze(root, cs, &mut info);
    info
}

fn analyze(node: &Node<Expr>, cs: &ConstraintSystem, info: &mut LinkedTypeInfo) {
    match &node.value {
        Expr::Literal(Literal::Int(_)) => info.have_int_literal = true,
        Expr::Literal(Literal::Float(_)) => info.have_float_literal = true,
        Expr::Literal(Literal::Str(_)) => info.have_string_literal = true,
        Expr::Literal(Literal::Bool(_)) => {}
        // operator applications stay part of the chain
        Expr::Apply { arg, style, .. } if *style != ApplyStyle::Call => analyze(arg, cs, info),
        Expr::Apply { .. } => {
            if let Some(ty) = pinned_ty(node, cs) {
                info.collected.push(ty);
            }
        }
        Expr::Member { .. } => {
            match cs.ty(node.id) {
                Some(ty) if !ty.is_var() => info.collected.push(ty.clone()),
                _ => {}
            }
        }
        // a closure body is its own scope
        Expr::Closure { .. } => {}
        value => {
            if let Some(ty) = cs.favored_ty(node.id) {
                info.collected.push(ty.clone());
            } else {
                value.each_child(&mut |child| analyze(child, cs, info));
            }
        }
    }
}

fn pinned_ty(node: &Node<Expr>, cs: &ConstraintSystem) -> Option<Ty> {
    if let Some(ty) = cs.favored_ty(node.id) {
        return Some(ty.clone());
    }
    match cs.ty(node.id) {
        Some(ty) if !ty.is_var() => Some(ty.clone()),
        _ => None,
    }
}

/// Resolve a chain's favored type from its accumulated evidence. Collected
/// concrete types win over literal defaults; float is checked before integer,
/// matching the widening convention for numeric literals.
pub fn compute_favored_ty(info: &LinkedTypeInfo, decls: &DeclTable) -> Option<Ty> {
    if let Some(first) = info.collected.first() {
        return Some(first.clone());
    }

    if info.have_float_literal {
        decls.default_ty(Capability::FloatLiteral)
    } else if info.have_int_literal {
        decls.default_ty(Capability::IntegerLiteral)
    } else if info.have_string_literal {
        decls.default_ty(Capability::StringLiteral)
    } else {
        None
    }
}

/// Record a favored type on every chain root in the tree.
pub fn optimize_linked_exprs(root: &Node<Expr>, cs: &mut ConstraintSystem, decls: &DeclTable) {
    let mut chains = vec![];
    collect_chains(root, &mut chains);

    for chain in chains {
        let info = analyze_chain(chain, cs);
        if let Some(ty) = compute_favored_ty(&info, decls) {
            log::debug!("chain at {:x} favors {}", chain.id, ty);
            cs.set_favored_ty(chain.id, ty);
        }
    }
}

#[cfg(test)]
mod linked_tests {
    use super::*;
    use crate::{
        ast::TupleExprElt,
        typing::decls::{DeclId, DeclInfo},
    };

    fn binary(callee: Node<Expr>, lhs: Node<Expr>, rhs: Node<Expr>) -> Node<Expr> {
        Node::new(Expr::Apply {
            callee: Box::new(callee),
            arg: Box::new(Node::new(Expr::Tuple(vec![
                TupleExprElt::from(lhs),
                TupleExprElt::from(rhs),
            ]))),
            style: ApplyStyle::Binary,
        })
    }

    fn plus(decls: &mut DeclTable) -> Node<Expr> {
        let id = decls
            .define(DeclInfo::new(
                "+",
                Ty::func(vec![Ty::int(), Ty::int()], Ty::int()),
            ))
            .unwrap();
        Node::new(Expr::OverloadedName {
            name: str!("+"),
            decls: vec![id],
            specialized: false,
        })
    }

    #[test]
    fn test_single_literal_kind_uses_default() {
        let mut decls = DeclTable::new();
        let op = plus(&mut decls);
        let tree = binary(
            op,
            Node::new(Expr::Literal(Literal::Int(1))),
            Node::new(Expr::Literal(Literal::Int(2))),
        );

        let mut cs = ConstraintSystem::new();
        optimize_linked_exprs(&tree, &mut cs, &decls);
        assert_eq!(cs.favored_ty(tree.id), Some(&Ty::int()));

        // running the analyzer again yields the same favored type
        optimize_linked_exprs(&tree, &mut cs, &decls);
        assert_eq!(cs.favored_ty(tree.id), Some(&Ty::int()));
    }

    #[test]
    fn test_float_beats_int() {
        let mut decls = DeclTable::new();
        let op = plus(&mut decls);
        let tree = binary(
            op,
            Node::new(Expr::Literal(Literal::Int(1))),
            Node::new(Expr::Literal(Literal::Float(1.0))),
        );

        let mut cs = ConstraintSystem::new();
        optimize_linked_exprs(&tree, &mut cs, &decls);
        assert_eq!(cs.favored_ty(tree.id), Some(&Ty::float()));
    }

    #[test]
    fn test_literal_under_unary_operator_is_seen() {
        // (-1) + x: the literal inside the prefix application still counts
        // as chain evidence
        let mut decls = DeclTable::new();
        let op = plus(&mut decls);
        let neg = Node::new(Expr::OverloadedName {
            name: str!("-"),
            decls: vec![DeclId(0)],
            specialized: false,
        });
        let negated = Node::new(Expr::Apply {
            callee: Box::new(neg),
            arg: Box::new(Node::new(Expr::Literal(Literal::Int(1)))),
            style: ApplyStyle::Prefix,
        });
        let tree = binary(op, negated, Node::new(Expr::Discard));

        let mut cs = ConstraintSystem::new();
        optimize_linked_exprs(&tree, &mut cs, &decls);
        assert_eq!(cs.favored_ty(tree.id), Some(&Ty::int()));
    }

    #[test]
    fn test_collected_evidence_beats_literal_defaults() {
        let mut decls = DeclTable::new();
        let op = plus(&mut decls);
        let call = Node::new(Expr::Apply {
            callee: Box::new(Node::new(Expr::Name {
                decl: DeclId(0),
                specialized: false,
            })),
            arg: Box::new(Node::new(Expr::Tuple(vec![]))),
            style: ApplyStyle::Call,
        });
        let call_id = call.id;
        let tree = binary(op, Node::new(Expr::Literal(Literal::Int(1))), call);

        let mut cs = ConstraintSystem::new();
        cs.set_favored_ty(call_id, Ty::string());
        optimize_linked_exprs(&tree, &mut cs, &decls);
        assert_eq!(cs.favored_ty(tree.id), Some(&Ty::string()));
    }

    #[test]
    fn test_lone_string_literal_chain() {
        let decls = DeclTable::new();
        let tree = Node::new(Expr::Literal(Literal::Str(str!("hi"))));

        let mut cs = ConstraintSystem::new();
        optimize_linked_exprs(&tree, &mut cs, &decls);
        assert_eq!(cs.favored_ty(tree.id), Some(&Ty::string()));
    }

    #[test]
    fn test_nested_binary_is_one_chain() {
        let mut decls = DeclTable::new();
        let op1 = plus(&mut decls);
        let op2 = plus(&mut decls);
        let inner = binary(
            op1,
            Node::new(Expr::Literal(Literal::Int(1))),
            Node::new(Expr::Literal(Literal::Int(2))),
        );
        let inner_id = inner.id;
        let tree = binary(op2, inner, Node::new(Expr::Literal(Literal::Int(3))));

        let mut chains = vec![];
        collect_chains(&tree, &mut chains);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].id, tree.id);

        let mut cs = ConstraintSystem::new();
        optimize_linked_exprs(&tree, &mut cs, &decls);
        assert_eq!(cs.favored_ty(tree.id), Some(&Ty::int()));
        // the nested application is part of the outer chain, not its own
        assert_eq!(cs.favored_ty(inner_id), None);
    }
}
