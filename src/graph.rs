//! The factor graph: node registry, construction and edit operations, and the
//! synchronous two-phase message-passing round.

use constant::ConstantNode;
use factor::{Compatibility, FactorNode, Table};
use message::{self, Message};
use node::{ConstantHandle, FactorHandle, Node, NodeHandle, NodeId, VariableHandle};
use util::{LoopyError, Result};
use variable::VariableNode;

use bidir_map::BidirMap;
use indexmap::IndexMap;
use ndarray::prelude as nd;

/// A factor graph: a registry of constant, variable and factor nodes whose
/// edges are the matching entries in the nodes' message mappings.
///
/// Inference proceeds by synchronous rounds (see `run_round`): every node
/// computes its new outgoing messages from the state committed at the end of
/// the previous round, and only then does any node commit. Because phase 1
/// reads nothing but committed state, the result of a round does not depend
/// on registration order.
///
/// The graph is generic over the domain value type; a single graph draws all
/// of its domains from one type.
pub struct FactorGraph<T> {

    /// All nodes, in registration order.
    nodes: IndexMap<NodeId, Node<T>>,

    /// Two-way handle <-> name lookup.
    names: BidirMap<NodeId, String>,

    /// The next identifier to hand out. Identifiers are never reused, so a
    /// handle kept across a removal dangles instead of rebinding.
    next_id: NodeId

}

impl<T: Clone + PartialEq + 'static> FactorGraph<T> {

    /// Construct a new, empty `FactorGraph`
    pub fn new() -> FactorGraph<T> {
        FactorGraph {
            nodes: IndexMap::new(),
            names: BidirMap::new(),
            next_id: 0
        }
    }

    /// The number of registered nodes of all kinds.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by name.
    pub fn lookup(&self, name: &str) -> Option<NodeHandle> {
        self.names.get_by_second(&String::from(name)).map(|&id| NodeHandle(id))
    }

    /// Look up a node's name.
    pub fn name_of<H: Into<NodeHandle>>(&self, handle: H) -> Option<&str> {
        let NodeHandle(id) = handle.into();
        self.names.get_by_first(&id).map(|name| name.as_str())
    }

    /// Register a variable with the given finite domain.
    ///
    /// The variable starts with no neighbors; message buffers are installed
    /// as factors connect to it.
    ///
    /// # Errors
    /// * `LoopyError::EmptyDomain` if the domain holds no values
    /// * `LoopyError::DuplicateName` if the name is taken
    pub fn add_variable(&mut self, name: &str, domain: Vec<T>) -> Result<VariableHandle> {
        self.check_name(name)?;
        if domain.is_empty() {
            return Err(LoopyError::EmptyDomain);
        }

        let node = Node::Variable(VariableNode::new(name, domain));
        Ok(VariableHandle(self.register(name, node)))
    }

    /// Register a constant evidence node.
    ///
    /// `weights` is normalized to sum to 1; a degenerate weight vector
    /// (summing to ~0) falls back to the uniform distribution over the domain
    /// rather than failing.
    ///
    /// # Errors
    /// * `LoopyError::EmptyDomain` if the domain holds no values
    /// * `LoopyError::DuplicateName` if the name is taken
    /// * `LoopyError::WeightMismatch` if `weights` and `domain` differ in length
    pub fn add_constant(&mut self, name: &str, domain: Vec<T>, weights: &[f64]) -> Result<ConstantHandle> {
        self.check_name(name)?;
        if domain.is_empty() {
            return Err(LoopyError::EmptyDomain);
        }
        if weights.len() != domain.len() {
            return Err(LoopyError::WeightMismatch);
        }

        let node = Node::Constant(ConstantNode::new(name, domain, weights));
        Ok(ConstantHandle(self.register(name, node)))
    }

    /// Register a factor over `arguments` with an explicit compatibility
    /// function.
    ///
    /// Every argument handle is validated before any state changes, so a
    /// failed registration leaves the graph untouched. On success the edge
    /// buffers are installed on both sides at once: the factor's committed
    /// messages and the connected variables' outgoing messages start uniform.
    ///
    /// Each update round evaluates `compatibility` once per combination of
    /// argument values - the cost is the product of all the argument domain
    /// sizes, so high-arity factors over large domains get expensive fast. A
    /// state space that overflows `usize` is rejected here.
    ///
    /// # Errors
    /// * `LoopyError::DuplicateName` if the name is taken
    /// * `LoopyError::EmptyScope` if `arguments` is empty
    /// * `LoopyError::UnknownNode` if an argument handle dangles
    /// * `LoopyError::StateSpaceOverflow` per above
    pub fn add_factor<F>(&mut self, name: &str, arguments: &[NodeHandle], compatibility: F) -> Result<FactorHandle>
        where F: Fn(&[T]) -> f64 + 'static
    {
        self.check_factor_scope(name, arguments)?;
        Ok(FactorHandle(self.register_factor(name, arguments, Box::new(compatibility))))
    }

    /// Register a factor whose compatibility comes from a lookup table with
    /// one axis per argument, indexed by each value's position within its own
    /// domain. Sugar over `add_factor`: the resulting factor produces exactly
    /// the messages the equivalent closure would.
    ///
    /// The table shape is validated against the argument domains, and every
    /// domain value must be locatable by equality within its own domain, so
    /// lookup failures surface here rather than mid-round.
    ///
    /// # Errors
    /// Those of `add_factor`, plus:
    /// * `LoopyError::TableShapeMismatch` if the table axes do not match the
    ///   argument domain cardinalities
    /// * `LoopyError::ValueNotInDomain` if a domain value cannot be found in
    ///   its own domain by equality
    pub fn add_factor_from_table(&mut self, name: &str, arguments: &[NodeHandle], table: Table) -> Result<FactorHandle> {
        self.check_factor_scope(name, arguments)?;

        let domains: Vec<Vec<T>> = arguments.iter()
                                            .map(|&NodeHandle(a)| self.argument_domain(a).to_vec())
                                            .collect();

        if table.ndim() != domains.len() {
            return Err(LoopyError::TableShapeMismatch);
        }
        for (d, &t) in domains.iter().zip(table.shape().iter()) {
            if d.len() != t {
                return Err(LoopyError::TableShapeMismatch);
            }
        }
        for d in domains.iter() {
            for v in d.iter() {
                if d.iter().position(|x| x == v).is_none() {
                    return Err(LoopyError::ValueNotInDomain);
                }
            }
        }

        let lookup = move |values: &[T]| -> f64 {
            let idxs: Vec<usize> = values.iter()
                .zip(domains.iter())
                .map(|(v, d)| {
                    d.iter().position(|x| x == v).expect(
                        "factor table queried with a value missing from its argument domain"
                    )
                })
                .collect();

            table[nd::IxDyn(&idxs)]
        };

        Ok(FactorHandle(self.register_factor(name, arguments, Box::new(lookup))))
    }

    /// Remove a factor and unregister its edges from every connected
    /// variable.
    ///
    /// This is a structural edit and must happen between rounds, never
    /// concurrently with one. Removal is symmetric; a variable buffer found
    /// missing for a factor that references it means the structure was
    /// already corrupt, and that is fatal.
    ///
    /// # Errors
    /// * `LoopyError::UnknownNode` if the handle dangles
    pub fn remove_factor(&mut self, handle: FactorHandle) -> Result<()> {
        let FactorHandle(id) = handle;
        let factor = match self.nodes.shift_remove(&id) {
            Some(Node::Factor(f)) => f,
            Some(_) => panic!("factor handle {} resolved to a non-factor node", id),
            None => return Err(LoopyError::UnknownNode)
        };
        self.names.remove_by_first(&id);

        for v in factor.connected_variables() {
            match self.nodes.get_mut(&v) {
                Some(&mut Node::Variable(ref mut var)) => var.unregister_edge(id),
                _ => panic!("factor '{}' references a node that is not a live variable", factor.name())
            }
        }

        Ok(())
    }

    /// Remove a variable that no factor references. Removal while factors
    /// are still connected is refused; remove those factors first.
    ///
    /// # Errors
    /// * `LoopyError::UnknownNode` if the handle dangles
    /// * `LoopyError::VariableInUse` if the variable still has neighbors
    pub fn remove_variable(&mut self, handle: VariableHandle) -> Result<()> {
        let VariableHandle(id) = handle;
        {
            let var = match self.nodes.get(&id) {
                Some(&Node::Variable(ref v)) => v,
                Some(_) => panic!("variable handle {} resolved to a non-variable node", id),
                None => return Err(LoopyError::UnknownNode)
            };

            if var.degree() > 0 {
                return Err(LoopyError::VariableInUse(String::from(var.name())));
            }
        }

        self.nodes.shift_remove(&id);
        self.names.remove_by_first(&id);
        Ok(())
    }

    /// Perform exactly one synchronous update round.
    ///
    /// Phase 1 computes every node's new outgoing messages from the messages
    /// committed at the end of the previous round and stages them into the
    /// node's private scratch buffers. Phase 2 commits every node's staged
    /// messages at once. No node observes a neighbor's new value before the
    /// commit phase, so the round is deterministic and independent of
    /// registration order.
    pub fn run_round(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().cloned().collect();

        // phase 1: compute against the frozen previous round, stage privately
        let mut staged = Vec::with_capacity(ids.len());
        for &id in ids.iter() {
            if let Some(msgs) = self.nodes[&id].compute_messages(id, self) {
                staged.push((id, msgs));
            }
        }
        for (id, msgs) in staged {
            self.node_mut(id).stage(msgs);
        }

        // phase 2: every node atomically adopts its staged messages
        for &id in ids.iter() {
            self.node_mut(id).commit();
        }
    }

    /// The approximate marginal distribution of a variable, normalized to
    /// sum to 1.
    pub fn marginal(&self, handle: VariableHandle) -> Result<Message> {
        let VariableHandle(id) = handle;
        match self.nodes.get(&id) {
            Some(&Node::Variable(ref v)) => Ok(v.marginal(id, self)),
            Some(_) => panic!("variable handle {} resolved to a non-variable node", id),
            None => Err(LoopyError::UnknownNode)
        }
    }

    /// The fixed distribution a constant emits.
    pub fn distribution(&self, handle: ConstantHandle) -> Result<&Message> {
        let ConstantHandle(id) = handle;
        match self.nodes.get(&id) {
            Some(&Node::Constant(ref c)) => Ok(c.emit()),
            Some(_) => panic!("constant handle {} resolved to a non-constant node", id),
            None => Err(LoopyError::UnknownNode)
        }
    }

    /// The committed message from `factor` to `variable`.
    pub(crate) fn factor_message(&self, factor: NodeId, variable: NodeId) -> &Message {
        match self.nodes.get(&factor) {
            Some(&Node::Factor(ref f)) => f.message_to(variable),
            _ => panic!("variable references node {} which is not a live factor", factor)
        }
    }

    /// The committed message (or fixed distribution) sent by argument `arg`
    /// to `factor`.
    pub(crate) fn argument_message(&self, arg: NodeId, factor: NodeId) -> &Message {
        match self.nodes.get(&arg) {
            Some(&Node::Constant(ref c)) => c.emit(),
            Some(&Node::Variable(ref v)) => v.message_to(factor),
            _ => panic!("factor references node {} which is not a live variable or constant", arg)
        }
    }

    /// The domain of a variable or constant argument.
    pub(crate) fn argument_domain(&self, arg: NodeId) -> &[T] {
        match self.nodes.get(&arg) {
            Some(&Node::Constant(ref c)) => c.domain(),
            Some(&Node::Variable(ref v)) => v.domain(),
            _ => panic!("factor references node {} which is not a live variable or constant", arg)
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.nodes.get_mut(&id).expect("node registry lost an id mid-round")
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if self.names.get_by_second(&String::from(name)).is_some() {
            Err(LoopyError::DuplicateName(String::from(name)))
        } else {
            Ok(())
        }
    }

    /// Validate a factor's name and argument list without touching the graph.
    fn check_factor_scope(&self, name: &str, arguments: &[NodeHandle]) -> Result<()> {
        self.check_name(name)?;
        if arguments.is_empty() {
            return Err(LoopyError::EmptyScope);
        }

        let mut states: usize = 1;
        for &NodeHandle(arg) in arguments.iter() {
            let cardinality = match self.nodes.get(&arg) {
                Some(&Node::Variable(ref v)) => v.cardinality(),
                Some(&Node::Constant(ref c)) => c.cardinality(),
                Some(&Node::Factor(_)) => {
                    return Err(LoopyError::General(
                        String::from("a factor cannot be an argument of another factor")
                    ));
                },
                None => return Err(LoopyError::UnknownNode)
            };

            states = match states.checked_mul(cardinality) {
                Some(s) => s,
                None => return Err(LoopyError::StateSpaceOverflow)
            };
        }

        Ok(())
    }

    fn register(&mut self, name: &str, node: Node<T>) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, node);
        self.names.insert(id, String::from(name));
        id
    }

    /// Install a validated factor, registering both sides of every edge
    /// before the factor becomes visible in the registry.
    fn register_factor(&mut self, name: &str, arguments: &[NodeHandle], compatibility: Compatibility<T>) -> NodeId {
        // message buffers toward each distinct variable argument, sized by
        // its domain; a variable repeated in the argument list holds a single
        // edge
        let mut outbound = IndexMap::new();
        for &NodeHandle(arg) in arguments.iter() {
            if let Some(&Node::Variable(ref v)) = self.nodes.get(&arg) {
                outbound.insert(arg, message::uniform(v.cardinality()));
            }
        }

        let id = self.next_id;
        self.next_id += 1;

        for (&arg, _) in outbound.iter() {
            match self.nodes.get_mut(&arg) {
                Some(&mut Node::Variable(ref mut v)) => v.register_edge(id),
                _ => panic!("argument {} vanished during factor registration", arg)
            }
        }

        let args: Vec<NodeId> = arguments.iter().map(|&NodeHandle(a)| a).collect();
        self.nodes.insert(id, Node::Factor(FactorNode::new(name, args, compatibility, outbound)));
        self.names.insert(id, String::from(name));
        id
    }

}
