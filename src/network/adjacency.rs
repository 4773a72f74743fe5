/*!

`Adjacency` is the storage type for one graph: a list of neighbour lists indexed by node. Every node in
`[0, len)` has a list, possibly empty.

Lists may contain repeats. Randomly added links are not deduplicated unless the caller rejects them
before insertion, so the structure behaves as a multigraph. Links are usually added in both directions;
`add_arc` adds a single direction for influence that only flows one way.

*/

use crate::NodeId;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Adjacency {
    /// The backing storage vector for the adjacency lists.
    neighbours: Vec<Vec<NodeId>>,
}

impl Adjacency {
    /// Creates `nodes` empty neighbour lists.
    #[must_use]
    pub fn new(nodes: usize) -> Self {
        Adjacency {
            neighbours: vec![Vec::new(); nodes],
        }
    }

    /// Number of nodes, including isolated ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }

    /// Links `a` and `b` in both directions.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        self.neighbours[a].push(b);
        self.neighbours[b].push(a);
    }

    /// Adds `to` to the neighbour list of `from` only.
    pub fn add_arc(&mut self, from: NodeId, to: NodeId) {
        self.neighbours[from].push(to);
    }

    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn neighbours(&self, node: NodeId) -> &[NodeId] {
        &self.neighbours[node]
    }

    /// True if `b` is in the neighbour list of `a`.
    #[must_use]
    pub fn contains(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbours[a].contains(&b)
    }

    /// True if either node lists the other.
    #[must_use]
    pub fn connected(&self, a: NodeId, b: NodeId) -> bool {
        self.contains(a, b) || self.contains(b, a)
    }

    #[must_use]
    pub fn degree(&self, node: NodeId) -> usize {
        self.neighbours[node].len()
    }

    /// Average neighbour-list length over all nodes, or zero for an empty graph.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_degree(&self) -> f64 {
        if self.neighbours.is_empty() {
            return 0.0;
        }
        let total: usize = self.neighbours.iter().map(Vec::len).sum();
        total as f64 / self.neighbours.len() as f64
    }

    #[must_use]
    pub fn has_self_loops(&self) -> bool {
        self.iter()
            .any(|(node, neighbours)| neighbours.contains(&node))
    }

    /// Iterates over `(node, neighbours)` pairs in node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[NodeId])> {
        self.neighbours
            .iter()
            .enumerate()
            .map(|(node, neighbours)| (node, neighbours.as_slice()))
    }
}
