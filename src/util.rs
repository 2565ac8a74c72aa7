//! Defines the `Error` type for the loopy library

use std::error::Error;
use std::fmt;
use std::result;

pub type Result<T> = result::Result<T, LoopyError>;

#[derive(Clone, Debug)]
pub enum LoopyError {

    /// A variable or constant was declared over a domain with no values
    EmptyDomain,

    /// A node name is already taken by another node in the graph.
    /// The value in the tuple is the offending name.
    DuplicateName(String),

    /// A handle that does not resolve to a live node (typically a node that
    /// has been removed from the graph)
    UnknownNode,

    /// A factor was declared over an empty argument list
    EmptyScope,

    /// A constant's weight vector does not match the cardinality of its domain
    WeightMismatch,

    /// A factor table whose dimensions do not match its argument domains
    TableShapeMismatch,

    /// A domain value that cannot be located within its own domain by equality
    ValueNotInDomain,

    /// The joint state space of a factor's arguments is too large to enumerate
    StateSpaceOverflow,

    /// An attempt to remove a variable while factors still reference it.
    /// The value in the tuple is the variable's name.
    VariableInUse(String),

    /// A general error with the given description
    General(String)

}

impl fmt::Display for LoopyError {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &LoopyError::EmptyDomain => write!(f, "Declared a domain with no values"),
            &LoopyError::DuplicateName(ref name) => write!(f, "The name '{}' is already taken", name),
            &LoopyError::UnknownNode => write!(f, "Handle does not resolve to a live node"),
            &LoopyError::EmptyScope => write!(f, "Declared a factor with no arguments"),
            &LoopyError::WeightMismatch => write!(f, "Weight vector does not match the domain cardinality"),
            &LoopyError::TableShapeMismatch => write!(f, "Table dimensions do not match the argument domains"),
            &LoopyError::ValueNotInDomain => write!(f, "A value is not present in the corresponding domain"),
            &LoopyError::StateSpaceOverflow => write!(f, "The joint state space of the factor arguments overflows a usize"),
            &LoopyError::VariableInUse(ref name) => write!(f, "Variable '{}' is still referenced by one or more factors", name),
            &LoopyError::General(ref err) => write!(f, "{}", err)
        }
    }

}

impl Error for LoopyError {}
