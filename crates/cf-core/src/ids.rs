use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier for a node slot inside a network.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<NodeId>` to be pointer-optimized, which matters
///   because every node stores its (possibly absent) downstream receiver
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Create a NodeId from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        // index+1 must be nonzero
        Self(NonZeroU32::new(index + 1).expect("index+1 is nonzero"))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.index())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Fully qualified location of an element inside a network.
///
/// Used to key recorded state trajectories and to name the offender in
/// simulation errors. Rendered as `node/unit/element`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ElementPath {
    pub node: String,
    pub unit: String,
    pub element: String,
}

impl ElementPath {
    pub fn new(
        node: impl Into<String>,
        unit: impl Into<String>,
        element: impl Into<String>,
    ) -> Self {
        Self {
            node: node.into(),
            unit: unit.into(),
            element: element.into(),
        }
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.node, self.unit, self.element)
    }
}
