//! Bottom-up tree simplification
//!
//! Two local rewrites run over the tree in post-order. At every position the
//! children are simplified first, then constant folding is attempted, then
//! peephole strength reduction. Because folding runs first, a node it
//! replaces is already a `NUMBER_DATA` literal when the peephole looks at it.
//! The peephole skips nodes whose operands are both literals, so a product
//! folding rejected for overflow stays as written and a second pass is a
//! no-op.
//!
//! Neither rewrite can fail. An operator outside the folding set, a
//! non-literal operand, division by zero, overflow or an out-of-range shift
//! amount simply leaves the node as it is.

use crate::node::{Node, NodeKind, Operator};
use tracing::{debug, trace};

impl Node {
    /// Simplifies the subtree, returning its (possibly replaced) root
    #[must_use]
    pub fn simplify(self) -> Self {
        let Self {
            kind,
            children,
            symbol,
        } = self;
        let children = children.into_iter().map(Self::simplify).collect();
        let node = Self {
            kind,
            children,
            symbol,
        };

        strength_reduce(constant_fold(node))
    }
}

/// Replaces an all-literal arithmetic expression by its value
fn constant_fold(node: Node) -> Node {
    let NodeKind::Expression(op) = node.kind else {
        return node;
    };
    if !is_foldable(op) {
        return node;
    }

    let Some(operands) = node
        .children
        .iter()
        .map(Node::as_number)
        .collect::<Option<Vec<_>>>()
    else {
        return node;
    };

    let Some(value) = fold_operands(op, &operands) else {
        debug!(%op, ?operands, "constant folding skipped, result is undefined");
        return node;
    };

    let folded = Node::number(value);
    let released = node.destroy();
    trace!(%op, ?operands, value, released, "folded constant expression");
    folded
}

const fn is_foldable(op: Operator) -> bool {
    matches!(
        op,
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Shl | Operator::Shr
    )
}

/// Folds left to right; a lone operand is applied to an implicit zero
fn fold_operands(op: Operator, operands: &[i64]) -> Option<i64> {
    let (&first, rest) = operands.split_first()?;
    if rest.is_empty() {
        return apply(op, 0, first);
    }
    rest.iter()
        .try_fold(first, |accumulator, &operand| apply(op, accumulator, operand))
}

fn apply(op: Operator, left: i64, right: i64) -> Option<i64> {
    match op {
        Operator::Add => left.checked_add(right),
        Operator::Sub => left.checked_sub(right),
        Operator::Mul => left.checked_mul(right),
        Operator::Div => left.checked_div(right),
        Operator::Shl => u32::try_from(right)
            .ok()
            .and_then(|amount| left.checked_shl(amount)),
        Operator::Shr => u32::try_from(right)
            .ok()
            .and_then(|amount| left.checked_shr(amount)),
        Operator::Rem | Operator::BitAnd | Operator::BitOr | Operator::BitXor => None,
    }
}

/// Rewrites multiplication and division by a power of two into shifts
///
/// A literal right operand of one collapses the node to its left operand.
/// Zero, negative and other non-power-of-two factors are left alone, and so
/// are all-literal nodes that folding had to give up on.
fn strength_reduce(mut node: Node) -> Node {
    let NodeKind::Expression(op @ (Operator::Mul | Operator::Div)) = node.kind else {
        return node;
    };
    let [left, right] = node.children.as_slice() else {
        return node;
    };
    if left.as_number().is_some() {
        return node;
    }
    let Some(factor) = right.as_number() else {
        return node;
    };

    if factor == 1 {
        let mut operands = std::mem::take(&mut node.children);
        let left = operands.swap_remove(0);
        let released: usize = operands.into_iter().map(Node::destroy).sum::<usize>() + node.destroy();
        trace!(%op, released, "elided identity operation");
        return left;
    }

    if factor > 1 && factor & (factor - 1) == 0 {
        let exponent = i64::from(factor.trailing_zeros());
        let shift = if op == Operator::Mul {
            Operator::Shl
        } else {
            Operator::Shr
        };
        node.kind = NodeKind::Expression(shift);
        node.children[1].kind = NodeKind::Number(exponent);
        trace!(%op, factor, exponent, "reduced to shift");
    }

    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::RelationOp;

    fn expr(op: Operator, operands: Vec<Node>) -> Node {
        Node::expression(op, operands)
    }

    fn x() -> Node {
        Node::identifier("x")
    }

    #[test]
    fn test_fold_add() {
        let tree = expr(Operator::Add, vec![Node::number(2), Node::number(3)]);
        assert_eq!(tree.simplify(), Node::number(5));
    }

    #[test]
    fn test_fold_sub() {
        let tree = expr(Operator::Sub, vec![Node::number(2), Node::number(3)]);
        assert_eq!(tree.simplify(), Node::number(-1));
    }

    #[test]
    fn test_fold_unary_minus() {
        let tree = expr(Operator::Sub, vec![Node::number(5)]);
        assert_eq!(tree.simplify(), Node::number(-5));
    }

    #[test]
    fn test_fold_shifts() {
        let tree = expr(Operator::Shl, vec![Node::number(3), Node::number(2)]);
        assert_eq!(tree.simplify(), Node::number(12));
        let tree = expr(Operator::Shr, vec![Node::number(-16), Node::number(2)]);
        assert_eq!(tree.simplify(), Node::number(-4));
    }

    #[test]
    fn test_fold_nested_bottom_up() {
        // (1 + 2) * (10 / 5)
        let tree = expr(
            Operator::Mul,
            vec![
                expr(Operator::Add, vec![Node::number(1), Node::number(2)]),
                expr(Operator::Div, vec![Node::number(10), Node::number(5)]),
            ],
        );
        assert_eq!(tree.simplify(), Node::number(6));
    }

    #[test]
    fn test_fold_skips_division_by_zero() {
        let tree = expr(Operator::Div, vec![Node::number(1), Node::number(0)]);
        assert_eq!(tree.clone().simplify(), tree);
    }

    #[test]
    fn test_fold_skips_overflow_and_bad_shift() {
        let overflow = expr(Operator::Add, vec![Node::number(i64::MAX), Node::number(1)]);
        assert_eq!(overflow.clone().simplify(), overflow);
        let negative_shift = expr(Operator::Shl, vec![Node::number(1), Node::number(-1)]);
        assert_eq!(negative_shift.clone().simplify(), negative_shift);
    }

    #[test]
    fn test_fold_ignores_unfoldable_operator() {
        let tree = expr(Operator::Rem, vec![Node::number(7), Node::number(2)]);
        assert_eq!(tree.clone().simplify(), tree);
    }

    #[test]
    fn test_fold_ignores_relations() {
        let tree = Node::relation(RelationOp::Lt, Node::number(1), Node::number(2));
        assert_eq!(tree.clone().simplify(), tree);
    }

    #[test]
    fn test_multiply_by_power_of_two() {
        let tree = expr(Operator::Mul, vec![x(), Node::number(8)]);
        assert_eq!(
            tree.simplify(),
            expr(Operator::Shl, vec![x(), Node::number(3)])
        );
    }

    #[test]
    fn test_divide_by_power_of_two() {
        let tree = expr(Operator::Div, vec![x(), Node::number(2)]);
        assert_eq!(
            tree.simplify(),
            expr(Operator::Shr, vec![x(), Node::number(1)])
        );
    }

    #[test]
    fn test_divide_by_one_elides_node() {
        let tree = expr(Operator::Div, vec![x(), Node::number(1)]);
        assert_eq!(tree.simplify(), x());
    }

    #[test]
    fn test_non_power_of_two_unchanged() {
        for factor in [3, 0, -4, 6] {
            let tree = expr(Operator::Mul, vec![x(), Node::number(factor)]);
            assert_eq!(tree.clone().simplify(), tree, "factor {factor}");
        }
    }

    #[test]
    fn test_non_literal_factor_unchanged() {
        let tree = expr(Operator::Mul, vec![Node::number(8), x()]);
        assert_eq!(tree.clone().simplify(), tree);
    }

    #[test]
    fn test_folded_literal_is_not_reduced_again() {
        let tree = expr(Operator::Mul, vec![Node::number(3), Node::number(8)]);
        assert_eq!(tree.simplify(), Node::number(24));
    }

    #[test]
    fn test_peephole_after_folding_right_operand() {
        // x * (2 + 2)
        let tree = expr(
            Operator::Mul,
            vec![x(), expr(Operator::Add, vec![Node::number(2), Node::number(2)])],
        );
        assert_eq!(
            tree.simplify(),
            expr(Operator::Shl, vec![x(), Node::number(2)])
        );
    }

    #[test]
    fn test_simplify_is_idempotent() {
        let tree = Node::list(vec![
            expr(Operator::Mul, vec![x(), Node::number(16)]),
            expr(Operator::Div, vec![expr(Operator::Mul, vec![x(), Node::number(1)]), Node::number(1)]),
            expr(Operator::Sub, vec![Node::number(4)]),
            expr(Operator::Div, vec![Node::number(4), Node::number(0)]),
            expr(Operator::Mul, vec![Node::number(i64::MAX), Node::number(4)]),
        ]);
        let once = tree.simplify();
        let twice = once.clone().simplify();
        assert_eq!(once, twice);
        assert_eq!(
            once,
            Node::list(vec![
                expr(Operator::Shl, vec![x(), Node::number(4)]),
                x(),
                Node::number(-4),
                expr(Operator::Div, vec![Node::number(4), Node::number(0)]),
                expr(Operator::Mul, vec![Node::number(i64::MAX), Node::number(4)]),
            ])
        );
    }

    #[test]
    fn test_overflowing_literals_are_not_reduced() {
        for op in [Operator::Mul, Operator::Div] {
            let tree = expr(op, vec![Node::number(i64::MIN), Node::number(-1)]);
            assert_eq!(tree.clone().simplify(), tree, "{op}");
        }
        let tree = expr(Operator::Mul, vec![Node::number(i64::MAX), Node::number(8)]);
        assert_eq!(tree.clone().simplify(), tree);
        assert_eq!(tree.clone().simplify().simplify(), tree);
    }

    #[test]
    fn test_destroy_after_simplify_counts_survivors() {
        let tree = Node::new(
            NodeKind::ReturnStatement,
            vec![expr(Operator::Div, vec![x(), Node::number(1)])],
        );
        let simplified = tree.simplify().simplify();
        assert_eq!(simplified.count(), 2);
        assert_eq!(simplified.destroy(), 2);
    }
}
