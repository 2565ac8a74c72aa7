//! Constant nodes - fixed evidence distributions over a finite domain.

use message::{self, Message};

/// A node holding a fixed, pre-normalized distribution over its domain.
///
/// Constants take part in factor evaluation exactly like variables, but they
/// emit the same distribution on every round and never receive messages.
pub struct ConstantNode<T> {
    name: String,
    domain: Vec<T>,
    prob: Message
}

impl<T: Clone + PartialEq> ConstantNode<T> {

    /// Construct a constant over `domain` with the given weights, normalized
    /// to sum to 1. A degenerate weight vector (summing to ~0) smooths to the
    /// uniform distribution over the domain rather than failing.
    pub(crate) fn new(name: &str, domain: Vec<T>, weights: &[f64]) -> ConstantNode<T> {
        let prob = message::normalized(&Message::from_vec(weights.to_vec()));

        ConstantNode {
            name: String::from(name),
            domain: domain,
            prob: prob
        }
    }

    /// Get the name of the constant
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn domain(&self) -> &[T] {
        &self.domain
    }

    pub(crate) fn cardinality(&self) -> usize {
        self.domain.len()
    }

    /// The emitted distribution - identical for every adjacent factor and
    /// every round.
    pub(crate) fn emit(&self) -> &Message {
        &self.prob
    }

}

// Unit tests for the ConstantNode struct.
#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn weights_are_normalized() {
        let node = ConstantNode::new("Foo", vec![true, false], &[2.0, 6.0]);
        assert_eq!(node.name(), "Foo");

        let prob = node.emit();
        assert!((prob[0] - 0.25).abs() < 1e-12);
        assert!((prob[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn degenerate_weights_fall_back_to_uniform() {
        let node = ConstantNode::new("Foo", vec![1, 2, 3, 4], &[0.0, 0.0, 0.0, 0.0]);

        let prob = node.emit();
        for i in 0..4 {
            assert!((prob[i] - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn emit_is_stable() {
        let node = ConstantNode::new("Foo", vec![true, false], &[0.9, 0.1]);

        let before = node.emit().clone();
        let after = node.emit();
        assert_eq!(before, *after);
    }

}
