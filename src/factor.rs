//! Factor nodes - local compatibility functions over an ordered argument
//! list, and the marginalization update that produces their outgoing
//! messages.

use graph::FactorGraph;
use message::{self, Message};
use node::NodeId;

use indexmap::IndexMap;
use itertools::Itertools;
use ndarray::prelude as nd;

use std::mem;

/// Alias f64 ndarray::Array as Table: a factor lookup table with one axis per
/// argument, indexed by each value's position within its own domain.
pub type Table = nd::ArrayD<f64>;

/// The compatibility function of a factor: a nonnegative score for one value
/// per argument, given in argument order.
pub type Compatibility<T> = Box<dyn Fn(&[T]) -> f64>;

/// A factor over an ordered sequence of variable and constant arguments.
///
/// Only variable arguments exchange messages; constant arguments contribute
/// their fixed distribution to the evaluation. `outbound` holds the committed
/// message per connected variable and `outbound_new` the accumulator the
/// current round sums into.
pub struct FactorNode<T> {
    name: String,

    /// The argument nodes, in the order the compatibility function expects
    /// their values.
    arguments: Vec<NodeId>,

    compatibility: Compatibility<T>,

    /// Committed messages, one per distinct variable argument.
    outbound: IndexMap<NodeId, Message>,

    /// The accumulator for the round in progress; zeroed between rounds.
    outbound_new: IndexMap<NodeId, Message>
}

impl<T: Clone + PartialEq + 'static> FactorNode<T> {

    pub(crate) fn new(
        name: &str,
        arguments: Vec<NodeId>,
        compatibility: Compatibility<T>,
        outbound: IndexMap<NodeId, Message>
    ) -> FactorNode<T> {
        let outbound_new = outbound.iter()
                                   .map(|(&v, msg)| (v, Message::zeros(msg.len())))
                                   .collect();

        FactorNode {
            name: String::from(name),
            arguments: arguments,
            compatibility: compatibility,
            outbound: outbound,
            outbound_new: outbound_new
        }
    }

    /// Get the name of the factor
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variables this factor sends messages to.
    pub(crate) fn connected_variables(&self) -> Vec<NodeId> {
        self.outbound.keys().cloned().collect()
    }

    /// The committed message addressed to `variable`.
    pub(crate) fn message_to(&self, variable: NodeId) -> &Message {
        self.outbound.get(&variable).expect(
            "factor has no message buffer for a variable it references"
        )
    }

    /// Compute this round's outgoing messages by marginalizing the weighted
    /// joint over every combination of argument values.
    ///
    /// This enumerates the full cartesian product of the argument domains:
    /// one round costs the product of all argument domain sizes, which grows
    /// multiplicatively with arity. Combinations scored nonpositive by the
    /// compatibility function contribute nothing and are skipped outright.
    ///
    /// For each surviving combination the incoming values (a constant's fixed
    /// entry, a variable's committed message entry) are folded through the
    /// same leave-one-out kernel the variable update uses, scoped to this
    /// factor's joint, and `score * leave_one_out(v, i)` is added into the
    /// accumulator cell of every variable argument `v` at its combination
    /// position `i`. Distinct combinations land in the same cell whenever the
    /// other arguments range over their domains, hence accumulation rather
    /// than overwrite.
    pub(crate) fn compute_messages(&self, me: NodeId, graph: &FactorGraph<T>) -> IndexMap<NodeId, Message> {
        let domains: Vec<&[T]> = self.arguments.iter()
                                               .map(|&a| graph.argument_domain(a))
                                               .collect();
        let inbound: Vec<&Message> = self.arguments.iter()
                                                   .map(|&a| graph.argument_message(a, me))
                                                   .collect();

        let mut accumulator: IndexMap<NodeId, Message> = self.outbound
            .iter()
            .map(|(&v, msg)| (v, Message::zeros(msg.len())))
            .collect();

        for combination in domains.iter().map(|d| 0..d.len()).multi_cartesian_product() {
            let values: Vec<T> = combination.iter()
                                            .zip(domains.iter())
                                            .map(|(&i, d)| d[i].clone())
                                            .collect();

            let score = (self.compatibility)(&values);
            if score <= 0.0 {
                continue;
            }

            let mut product = 1.0;
            let mut nonzero_product = 1.0;
            for (arg, &i) in inbound.iter().zip(combination.iter()) {
                message::fold_value(&mut product, &mut nonzero_product, arg[i]);
            }

            for (pos, &i) in combination.iter().enumerate() {
                // constant arguments hold no accumulator entry and receive
                // nothing; a variable repeated in the argument list shares
                // one entry and both occurrences add into it
                if let Some(buf) = accumulator.get_mut(&self.arguments[pos]) {
                    buf[i] += score * message::leave_one_out(product, nonzero_product, inbound[pos][i]);
                }
            }
        }

        accumulator
    }

    /// Overwrite the accumulator with this round's computed messages.
    pub(crate) fn stage(&mut self, staged: IndexMap<NodeId, Message>) {
        for (variable, msg) in staged {
            let buf = self.outbound_new.get_mut(&variable).expect(
                "staged a message for a variable that is not connected"
            );
            *buf = msg;
        }
    }

    /// Adopt the accumulator as the committed messages and zero the previous
    /// buffers for reuse as the next round's accumulator. Factor messages are
    /// weighted sums, not probabilities; they are normalized only when
    /// consumed at the variable side.
    pub(crate) fn commit(&mut self) {
        mem::swap(&mut self.outbound, &mut self.outbound_new);
        for msg in self.outbound_new.values_mut() {
            msg.fill(0.0);
        }
    }

}

// Unit tests for the FactorNode struct. The marginalization update needs
// argument nodes to read from, so it is exercised with the graph module's
// tests; these cover the buffer mechanics in isolation.
#[cfg(test)]
mod tests {

    use super::*;

    fn two_state_factor() -> FactorNode<bool> {
        let mut outbound = IndexMap::new();
        outbound.insert(3, message::uniform(2));

        FactorNode::new("f", vec![3], Box::new(|_: &[bool]| 1.0), outbound)
    }

    #[test]
    fn new_zeroes_the_accumulator() {
        let factor = two_state_factor();
        assert_eq!(factor.name(), "f");
        assert_eq!(factor.connected_variables(), vec![3]);

        let acc = factor.outbound_new.get(&3).unwrap();
        assert_eq!(acc[0], 0.0);
        assert_eq!(acc[1], 0.0);
    }

    #[test]
    fn commit_swaps_and_zeroes_scratch() {
        let mut factor = two_state_factor();

        let mut staged = IndexMap::new();
        staged.insert(3, Message::from_vec(vec![5.0, 7.0]));
        factor.stage(staged);
        factor.commit();

        // the staged sums are committed unnormalized
        let committed = factor.message_to(3);
        assert_eq!(committed[0], 5.0);
        assert_eq!(committed[1], 7.0);

        // the retired buffer is zeroed, ready to accumulate again
        let scratch = factor.outbound_new.get(&3).unwrap();
        assert_eq!(scratch[0], 0.0);
        assert_eq!(scratch[1], 0.0);
    }

    #[test]
    #[should_panic]
    fn staging_for_a_stranger_is_fatal() {
        let mut factor = two_state_factor();

        let mut staged = IndexMap::new();
        staged.insert(42, Message::from_vec(vec![1.0, 1.0]));
        factor.stage(staged);
    }

}
