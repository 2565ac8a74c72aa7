//! Variable nodes - finite-domain random variables and the leave-one-out
//! message update at the heart of the sum-product algorithm.

use graph::FactorGraph;
use message::{self, Message};
use node::NodeId;

use indexmap::IndexMap;

use std::mem;

/// A random variable over a finite, ordered domain.
///
/// For each adjacent factor the variable holds two message buffers: the
/// committed message from the previous round (`outbound`) and the scratch
/// buffer the current round writes into (`outbound_new`). The pair is swapped
/// at commit time, so no neighbor ever observes a half-updated round.
pub struct VariableNode<T> {
    name: String,
    domain: Vec<T>,

    /// Committed messages, one per adjacent factor, keyed by factor id.
    /// Each sums to 1 after a commit.
    outbound: IndexMap<NodeId, Message>,

    /// This round's work in progress; overwritten each round, never
    /// accumulated across rounds.
    outbound_new: IndexMap<NodeId, Message>
}

impl<T: Clone + PartialEq + 'static> VariableNode<T> {

    pub(crate) fn new(name: &str, domain: Vec<T>) -> VariableNode<T> {
        VariableNode {
            name: String::from(name),
            domain: domain,
            outbound: IndexMap::new(),
            outbound_new: IndexMap::new()
        }
    }

    /// Get the name of the variable
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn domain(&self) -> &[T] {
        &self.domain
    }

    pub(crate) fn cardinality(&self) -> usize {
        self.domain.len()
    }

    /// The number of factors connected to this variable.
    pub(crate) fn degree(&self) -> usize {
        self.outbound.len()
    }

    /// The committed message addressed to `factor`.
    pub(crate) fn message_to(&self, factor: NodeId) -> &Message {
        self.outbound.get(&factor).expect(
            "variable has no message buffer for a factor that references it"
        )
    }

    /// Install the message buffers for a newly connected factor. Initial
    /// messages are uniform over the domain.
    pub(crate) fn register_edge(&mut self, factor: NodeId) {
        self.outbound.insert(factor, message::uniform(self.cardinality()));
        self.outbound_new.insert(factor, message::uniform(self.cardinality()));
    }

    /// Tear down the message buffers for a factor being removed. Both sides
    /// of an edge are registered together, so a missing buffer here means the
    /// graph structure was already corrupt.
    pub(crate) fn unregister_edge(&mut self, factor: NodeId) {
        self.outbound.shift_remove(&factor).expect(
            "removing an edge the variable never had (half-registered factor)"
        );
        self.outbound_new.shift_remove(&factor).expect(
            "removing an edge the variable never had (half-registered factor)"
        );
    }

    /// Compute this round's outgoing messages from the committed state of the
    /// adjacent factors.
    ///
    /// The outgoing message to factor `f` at position `i` is the product of
    /// the other factors' incoming messages at `i`. Where the incoming entry
    /// from `f` is safely nonzero the exclusion is performed by dividing it
    /// out of the full product; where it has vanished, the nonzero-product
    /// fallback stands in (see the message module).
    pub(crate) fn compute_messages(&self, me: NodeId, graph: &FactorGraph<T>) -> IndexMap<NodeId, Message> {
        let mut product = Message::ones(self.cardinality());
        let mut nonzero_product = Message::ones(self.cardinality());

        for &factor in self.outbound.keys() {
            message::fold_message(&mut product, &mut nonzero_product, graph.factor_message(factor, me));
        }

        let mut staged = IndexMap::new();
        for &factor in self.outbound.keys() {
            let inbound = graph.factor_message(factor, me);
            let msg: Vec<f64> = (0..self.cardinality())
                .map(|i| message::leave_one_out(product[i], nonzero_product[i], inbound[i]))
                .collect();

            staged.insert(factor, Message::from_vec(msg));
        }

        staged
    }

    /// Overwrite the scratch buffers with this round's computed messages.
    pub(crate) fn stage(&mut self, staged: IndexMap<NodeId, Message>) {
        for (factor, msg) in staged {
            let buf = self.outbound_new.get_mut(&factor).expect(
                "staged a message for a factor that is not connected"
            );
            *buf = msg;
        }
    }

    /// Adopt the staged messages: swap the buffer pair, then renormalize each
    /// now-committed message to sum to 1 so repeated rounds cannot drift
    /// without bound. The previous round's buffers become the next round's
    /// scratch.
    pub(crate) fn commit(&mut self) {
        mem::swap(&mut self.outbound, &mut self.outbound_new);
        for msg in self.outbound.values_mut() {
            message::normalize_in_place(msg);
        }
    }

    /// The approximate marginal: the normalized product of all committed
    /// incoming messages, or uniform when the variable has no neighbors.
    pub(crate) fn marginal(&self, me: NodeId, graph: &FactorGraph<T>) -> Message {
        let mut product = Message::ones(self.cardinality());
        for &factor in self.outbound.keys() {
            product = &product * graph.factor_message(factor, me);
        }

        message::normalized(&product)
    }

}
