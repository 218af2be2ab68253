pub type Result<T> = std::result::Result<T, TreeError>;

/// Caller/input errors surfaced by construction, shearing, and view lookups.
///
/// None of these are transient: they are never retried and propagate to the
/// embedding layer, which owns user-facing messaging.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The bit sequence is not a well-formed balanced-parenthesis encoding.
    #[error("malformed parenthesis sequence: {reason}")]
    MalformedSequence { reason: String },

    /// A parallel attribute array does not line up with the node count.
    #[error("attribute array holds {got} entries but the tree has {expected} nodes")]
    AttributeLength { expected: usize, got: usize },

    /// A shear keep-set matched no tip name in the tree.
    #[error("no tips matching the requested keep-set were found in the tree")]
    NoMatchingTips,

    /// A view lookup addressed a node that the current shear pruned away.
    #[error("node {node} is not present in the active tree")]
    NodeNotInActiveTree { node: usize },
}
