//! loopy - approximate inference over discrete factor graphs by loopy belief
//! propagation, the sum-product algorithm of Pearl and Koller & Friedman
//! Section 11.3.
//!
//! A `FactorGraph` is built from variables with finite domains, constants
//! carrying fixed evidence distributions, and factors scoring joint
//! assignments of their arguments. Repeated synchronous message-passing
//! rounds (`run_round`) then yield approximate marginals for every variable.
//! On an acyclic graph the marginals become exact once messages have crossed
//! its diameter; on a cyclic graph they are the usual loopy approximation,
//! and the caller decides how many rounds to run.

extern crate bidir_map;
extern crate indexmap;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate ndarray;

pub mod constant;
pub mod factor;
pub mod graph;
pub mod message;
pub mod node;
pub mod util;
pub mod variable;

pub use factor::Table;
pub use graph::FactorGraph;
pub use message::{Message, EPSILON};
pub use node::{ConstantHandle, FactorHandle, NodeHandle, VariableHandle};
pub use util::{LoopyError, Result};
