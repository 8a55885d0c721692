//! Operator overloading for the flow DSL
//!
//! `source >> target` builds an n-hop forward flow, `target << source` an
//! n-hop backward flow. Rust's comparison operators cannot return a value,
//! so the DSL's 1-hop `>` is spelled `source.direct(target)`. Unions and
//! intersections compose with `|` and `&`.

use std::ops::{BitAnd, BitOr, Shl, Shr};

use super::expressions::FlowExpr;
use super::selectors::NodeSelector;
use super::types::{SelectorType, TraversalDirection};

impl Shr<NodeSelector> for NodeSelector {
    type Output = FlowExpr;

    /// N-hop forward reachability: `source >> target`.
    fn shr(self, rhs: NodeSelector) -> FlowExpr {
        FlowExpr::new(self, rhs, TraversalDirection::Forward)
    }
}

impl Shl<NodeSelector> for NodeSelector {
    type Output = FlowExpr;

    /// N-hop backward reachability: `target << source`.
    ///
    /// A wildcard target is normalised to a forward flow: `Q.Var(None) <<
    /// Q.Var("x")` means "everything x flows to", identical to
    /// `Q.Var(None) >> Q.Var("x")` reversed, so the forward form is used.
    fn shl(self, rhs: NodeSelector) -> FlowExpr {
        if self.is_wildcard() {
            return FlowExpr::new(self, rhs, TraversalDirection::Forward);
        }
        FlowExpr::new(rhs, self, TraversalDirection::Backward)
    }
}

impl NodeSelector {
    /// 1-hop adjacency (the DSL's `>` operator).
    pub fn direct(self, target: NodeSelector) -> FlowExpr {
        FlowExpr::new(self, target, TraversalDirection::Forward).depth(1, 1)
    }
}

impl BitOr for NodeSelector {
    type Output = NodeSelector;

    /// Union: matches either operand. Chaining flattens.
    fn bitor(self, rhs: NodeSelector) -> NodeSelector {
        let mut operands = if self.selector_type == SelectorType::Union {
            self.operands
        } else {
            vec![self]
        };
        operands.push(rhs);
        let mut union = NodeSelector::new(SelectorType::Union);
        union.operands = operands;
        union
    }
}

impl BitAnd for NodeSelector {
    type Output = NodeSelector;

    /// Intersection: matches both operands. Chaining flattens.
    fn bitand(self, rhs: NodeSelector) -> NodeSelector {
        let mut operands = if self.selector_type == SelectorType::Intersection {
            self.operands
        } else {
            vec![self]
        };
        operands.push(rhs);
        let mut intersection = NodeSelector::new(SelectorType::Intersection);
        intersection.operands = operands;
        intersection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::query_engine::domain::factories::Q;

    #[test]
    fn test_forward_operator() {
        let expr = Q::var("user") >> Q::call("execute");
        assert_eq!(expr.direction, TraversalDirection::Forward);
        assert_eq!(expr.source.selector_type, SelectorType::Var);
        assert_eq!(expr.target.selector_type, SelectorType::Call);
    }

    #[test]
    fn test_backward_operator() {
        let expr = Q::call("execute") << Q::var("user");
        assert_eq!(expr.direction, TraversalDirection::Backward);
        assert_eq!(expr.source.selector_type, SelectorType::Var);
        assert_eq!(expr.target.selector_type, SelectorType::Call);
    }

    #[test]
    fn test_wildcard_backward_normalises_to_forward() {
        let expr = Q::var_any() << Q::var("x");
        assert_eq!(expr.direction, TraversalDirection::Forward);
        assert!(expr.source.is_wildcard());
    }

    #[test]
    fn test_direct_is_one_hop() {
        let expr = Q::func("caller").direct(Q::func("callee"));
        assert_eq!(expr.depth_range, (1, 1));
    }

    #[test]
    fn test_union_flattens() {
        let union = Q::var("a") | Q::var("b") | Q::var("c");
        assert_eq!(union.selector_type, SelectorType::Union);
        assert_eq!(union.operands.len(), 3);
    }

    #[test]
    fn test_intersection() {
        let inter = Q::var("x") & Q::source("request");
        assert_eq!(inter.selector_type, SelectorType::Intersection);
        assert_eq!(inter.operands.len(), 2);
    }
}
