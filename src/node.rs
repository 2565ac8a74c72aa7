//! Node identity and the two-phase update contract shared by all node kinds.
//!
//! Variables and factors reference each other through their message mappings,
//! which makes the graph cyclic. Nodes therefore live in a central registry
//! addressed by identifier, and every cross-node reference is an identifier
//! rather than a pointer; edge teardown becomes an explicit two-sided removal.

use constant::ConstantNode;
use factor::FactorNode;
use graph::FactorGraph;
use message::Message;
use variable::VariableNode;

use indexmap::IndexMap;

/// Internal node identifier. Identifiers are handed out once and never
/// reused, so a stale handle can dangle but never silently rebinds.
pub(crate) type NodeId = usize;

/// An opaque reference to a node that may appear in a factor's argument list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub(crate) NodeId);

/// A reference to a variable node in a `FactorGraph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VariableHandle(pub(crate) NodeId);

/// A reference to a constant (evidence) node in a `FactorGraph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstantHandle(pub(crate) NodeId);

/// A reference to a factor node in a `FactorGraph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FactorHandle(pub(crate) NodeId);

impl From<VariableHandle> for NodeHandle {
    fn from(handle: VariableHandle) -> NodeHandle {
        NodeHandle(handle.0)
    }
}

impl From<ConstantHandle> for NodeHandle {
    fn from(handle: ConstantHandle) -> NodeHandle {
        NodeHandle(handle.0)
    }
}

impl From<FactorHandle> for NodeHandle {
    fn from(handle: FactorHandle) -> NodeHandle {
        NodeHandle(handle.0)
    }
}

/// A node in the graph: a constant, a variable, or a factor.
pub(crate) enum Node<T> {
    Constant(ConstantNode<T>),
    Variable(VariableNode<T>),
    Factor(FactorNode<T>)
}

impl<T: Clone + PartialEq + 'static> Node<T> {

    /// Phase 1 of a round: compute this node's outgoing messages from the
    /// committed state of the previous round. Constants emit a fixed
    /// distribution and have nothing to compute.
    pub fn compute_messages(&self, me: NodeId, graph: &FactorGraph<T>) -> Option<IndexMap<NodeId, Message>> {
        match *self {
            Node::Constant(_) => None,
            Node::Variable(ref v) => Some(v.compute_messages(me, graph)),
            Node::Factor(ref f) => Some(f.compute_messages(me, graph))
        }
    }

    /// Phase 1 of a round: overwrite the node's scratch buffers with freshly
    /// computed messages. Never touches the committed buffers.
    pub fn stage(&mut self, staged: IndexMap<NodeId, Message>) {
        match *self {
            Node::Constant(_) => (),
            Node::Variable(ref mut v) => v.stage(staged),
            Node::Factor(ref mut f) => f.stage(staged)
        }
    }

    /// Phase 2 of a round: atomically adopt the staged messages as the
    /// committed ones.
    pub fn commit(&mut self) {
        match *self {
            Node::Constant(_) => (),
            Node::Variable(ref mut v) => v.commit(),
            Node::Factor(ref mut f) => f.commit()
        }
    }

}
