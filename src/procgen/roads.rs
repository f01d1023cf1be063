//! Road network over the block grid.
//!
//! Intersections are graph nodes, the road strips between them are edges
//! that can be open (drawn as road) or closed (swallowed by a multi-block
//! parcel). Uses petgraph for the underlying graph structure.

use bevy::prelude::*;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::{Bfs, EdgeFiltered, EdgeRef};

use super::grid::{CityGrid, GridEdge};

/// A road segment in the network.
#[derive(Clone, Copy, Debug)]
pub struct RoadSegment {
    pub edge: GridEdge,
    pub open: bool,
}

/// The solved road network.
#[derive(Clone, Debug)]
pub struct RoadNetwork {
    pub graph: UnGraph<IVec2, RoadSegment>,
    nodes: IVec2,
    vertical: Vec<EdgeIndex>,
    horizontal: Vec<EdgeIndex>,
}

impl RoadNetwork {
    /// Full grid with every edge open.
    pub fn new(grid: &CityGrid) -> Self {
        let nodes = grid.nodes();
        let mut graph = UnGraph::with_capacity(
            (nodes.x * nodes.y) as usize,
            (nodes.x * grid.blocks.y + nodes.y * grid.blocks.x) as usize,
        );
        for y in 0..nodes.y {
            for x in 0..nodes.x {
                graph.add_node(IVec2::new(x, y));
            }
        }

        let mut network = Self {
            graph,
            nodes,
            vertical: Vec::new(),
            horizontal: Vec::new(),
        };
        for edge in grid.edges() {
            let (a, b) = edge.endpoints();
            let (na, nb) = (network.node(a), network.node(b));
            let index = network.graph.add_edge(na, nb, RoadSegment { edge, open: true });
            match edge {
                GridEdge::Vertical { .. } => network.vertical.push(index),
                GridEdge::Horizontal { .. } => network.horizontal.push(index),
            }
        }
        network
    }

    fn node(&self, at: IVec2) -> NodeIndex {
        NodeIndex::new((at.y * self.nodes.x + at.x) as usize)
    }

    fn edge_index(&self, edge: GridEdge) -> Option<EdgeIndex> {
        let blocks = self.nodes - IVec2::ONE;
        match edge {
            GridEdge::Vertical { ix, iy } => {
                if ix < 0 || iy < 0 || ix >= self.nodes.x || iy >= blocks.y {
                    return None;
                }
                self.vertical.get((iy * self.nodes.x + ix) as usize).copied()
            }
            GridEdge::Horizontal { ix, iy } => {
                if ix < 0 || iy < 0 || ix >= blocks.x || iy >= self.nodes.y {
                    return None;
                }
                self.horizontal.get((iy * blocks.x + ix) as usize).copied()
            }
        }
    }

    /// Whether the edge is drawn as road. Unknown edges read as closed.
    pub fn is_open(&self, edge: GridEdge) -> bool {
        self.edge_index(edge)
            .and_then(|i| self.graph.edge_weight(i))
            .is_some_and(|s| s.open)
    }

    fn set_open(&mut self, edge: GridEdge, open: bool) {
        if let Some(segment) = self
            .edge_index(edge)
            .and_then(|i| self.graph.edge_weight_mut(i))
        {
            segment.open = open;
        }
    }

    /// Open edges incident to an intersection.
    pub fn open_degree(&self, at: IVec2) -> usize {
        self.graph
            .edges(self.node(at))
            .filter(|e| e.weight().open)
            .count()
    }

    pub fn open_edge_count(&self) -> usize {
        self.graph.edge_weights().filter(|s| s.open).count()
    }

    /// Every intersection reachable over open edges from the first one.
    pub fn is_connected(&self) -> bool {
        let count = self.graph.node_count();
        if count == 0 {
            return true;
        }
        let open = EdgeFiltered::from_fn(&self.graph, |e| e.weight().open);
        let mut bfs = Bfs::new(&open, NodeIndex::new(0));
        let mut seen = 0;
        while bfs.next(&open).is_some() {
            seen += 1;
        }
        seen == count
    }

    /// No intersection is left as a dead end.
    pub fn has_no_dead_ends(&self) -> bool {
        self.graph
            .node_indices()
            .all(|n| self.graph.edges(n).filter(|e| e.weight().open).count() != 1)
    }

    /// Greedily close candidate edges, best score first, keeping each
    /// closure only while the network stays connected without dead ends.
    /// Returns the number of edges closed.
    pub fn close_edges(&mut self, mut candidates: Vec<(GridEdge, u64)>) -> usize {
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut closed = 0;
        for (edge, _) in candidates {
            if !self.is_open(edge) {
                continue;
            }
            self.set_open(edge, false);

            let (a, b) = edge.endpoints();
            let ends_ok = self.open_degree(a) != 1 && self.open_degree(b) != 1;
            if ends_ok && self.is_connected() {
                closed += 1;
            } else {
                self.set_open(edge, true);
            }
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> (CityGrid, RoadNetwork) {
        let grid = CityGrid::fit(400, 400).unwrap();
        let net = RoadNetwork::new(&grid);
        (grid, net)
    }

    #[test]
    fn full_grid_is_open_and_connected() {
        let (grid, net) = network();
        assert_eq!(net.open_edge_count(), grid.edges().count());
        assert!(net.is_connected());
        assert!(net.has_no_dead_ends());
        assert!(net.is_open(GridEdge::Vertical { ix: 1, iy: 0 }));
        assert!(!net.is_open(GridEdge::Vertical { ix: 99, iy: 0 }));
    }

    #[test]
    fn closing_keeps_the_network_valid() {
        let (grid, mut net) = network();
        let candidates: Vec<_> = grid
            .edges()
            .filter(|e| grid.blocks_beside(*e).is_some())
            .enumerate()
            .map(|(i, e)| (e, (i as u64).wrapping_mul(0x9E37_79B9)))
            .collect();
        let total = candidates.len();
        let closed = net.close_edges(candidates);
        assert!(closed > 0);
        assert!(closed < total);
        assert!(net.is_connected());
        assert!(net.has_no_dead_ends());
    }

    #[test]
    fn dead_end_closures_are_rejected() {
        let (_, mut net) = network();
        // Closing three of the four edges at (1, 1) would strand it.
        let closed = net.close_edges(vec![
            (GridEdge::Vertical { ix: 1, iy: 0 }, 3),
            (GridEdge::Horizontal { ix: 0, iy: 1 }, 2),
            (GridEdge::Horizontal { ix: 1, iy: 1 }, 1),
        ]);
        assert_eq!(closed, 2);
        assert!(net.is_open(GridEdge::Horizontal { ix: 1, iy: 1 }));
        assert_eq!(net.open_degree(IVec2::new(1, 1)), 2);
        assert!(net.has_no_dead_ends());
        assert!(net.is_connected());
    }
}
