use std::collections::VecDeque;

use petgraph::Direction;
use petgraph::graph::DiGraph;
use petgraph::visit::{DfsPostOrder, EdgeRef as _};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{CfaEdge, EdgeKind, EdgeRef, FunctionInfo, Location, LocationInfo};

/// Edge list returned by adjacency queries; most locations have one or two.
pub type Edges<'a> = SmallVec<[EdgeRef<'a>; 2]>;

/// A control-flow automaton: the read-only program graph the analysis explores.
///
/// Locations are stable for the lifetime of the automaton and can be used as
/// partition keys. Adjacency queries return edges in insertion order so that
/// exploration is deterministic.
#[derive(Debug, Clone)]
pub struct Cfa {
    pub(crate) graph: DiGraph<LocationInfo, EdgeKind>,
    pub(crate) functions: FxHashMap<String, FunctionInfo>,
    pub(crate) main: String,
}

impl Cfa {
    /// Entry location of the main function.
    pub fn entry(&self) -> Location {
        self.main_function().entry
    }

    pub fn main_function(&self) -> &FunctionInfo {
        &self.functions[&self.main]
    }

    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.functions.values()
    }

    pub fn num_locations(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.graph.node_indices().map(Location::from)
    }

    pub fn location_info(&self, loc: Location) -> Option<&LocationInfo> {
        self.graph.node_weight(loc.index())
    }

    /// Get the info for `loc`, panicking if it does not belong to this automaton.
    pub fn expect_location(&self, loc: Location) -> &LocationInfo {
        self.location_info(loc).unwrap_or_else(|| {
            panic!("Expected to find location {loc} in CFA, but none was found.")
        })
    }

    pub fn error_locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.locations()
            .filter(|&loc| self.expect_location(loc).is_error())
    }

    pub fn edge(&self, edge: CfaEdge) -> Option<EdgeRef<'_>> {
        let index = edge.index();
        let (source, target) = self.graph.edge_endpoints(index)?;
        Some(EdgeRef {
            id: edge,
            source: source.into(),
            target: target.into(),
            kind: &self.graph[index],
        })
    }

    /// Location an edge leads to.
    pub fn successor(&self, edge: CfaEdge) -> Option<Location> {
        self.graph.edge_endpoints(edge.index()).map(|(_, t)| t.into())
    }

    /// Location an edge leaves from.
    pub fn predecessor(&self, edge: CfaEdge) -> Option<Location> {
        self.graph.edge_endpoints(edge.index()).map(|(s, _)| s.into())
    }

    pub fn outgoing_edges(&self, loc: Location) -> Edges<'_> {
        self.adjacent(loc, Direction::Outgoing)
    }

    pub fn incoming_edges(&self, loc: Location) -> Edges<'_> {
        self.adjacent(loc, Direction::Incoming)
    }

    /// Rank of `loc` in reverse postorder from the main entry (entry = 0).
    pub fn reverse_postorder(&self, loc: Location) -> u32 {
        self.expect_location(loc).rpo
    }

    /// Shortest number of edges from `loc` to an error location.
    pub fn distance_to_error(&self, loc: Location) -> Option<u32> {
        self.expect_location(loc).distance_to_error
    }

    fn adjacent(&self, loc: Location, dir: Direction) -> Edges<'_> {
        let mut edges: Edges<'_> = self
            .graph
            .edges_directed(loc.index(), dir)
            .map(|e| EdgeRef {
                id: e.id().into(),
                source: e.source().into(),
                target: e.target().into(),
                kind: e.weight(),
            })
            .collect();
        edges.sort_by_key(|e| e.id);
        edges
    }

    /// Number locations in reverse postorder, starting from the main entry and
    /// then from every location the first traversal did not reach.
    pub(crate) fn compute_reverse_postorder(&mut self) {
        let mut postorder = Vec::with_capacity(self.graph.node_count());
        let mut dfs = DfsPostOrder::new(&self.graph, self.entry().index());
        while let Some(node) = dfs.next(&self.graph) {
            postorder.push(node);
        }
        for node in self.graph.node_indices() {
            if dfs.discovered.contains(node.index()) {
                continue;
            }
            dfs.move_to(node);
            while let Some(n) = dfs.next(&self.graph) {
                postorder.push(n);
            }
        }
        let n = postorder.len() as u32;
        for (i, node) in postorder.into_iter().enumerate() {
            self.graph[node].rpo = n - 1 - i as u32;
        }
    }

    /// Multi-source breadth-first search backwards from all error locations.
    pub(crate) fn compute_distance_to_error(&mut self) {
        let mut distance: FxHashMap<Location, u32> = FxHashMap::default();
        let mut queue = VecDeque::new();
        for loc in self.error_locations().collect::<Vec<_>>() {
            distance.insert(loc, 0);
            queue.push_back(loc);
        }
        while let Some(loc) = queue.pop_front() {
            let d = distance[&loc];
            for pred in self.graph.neighbors_directed(loc.index(), Direction::Incoming) {
                let pred = Location::from(pred);
                if !distance.contains_key(&pred) {
                    distance.insert(pred, d + 1);
                    queue.push_back(pred);
                }
            }
        }
        for (loc, d) in distance {
            self.graph[loc.index()].distance_to_error = Some(d);
        }
    }
}

impl std::ops::Index<Location> for Cfa {
    type Output = LocationInfo;

    fn index(&self, loc: Location) -> &Self::Output {
        self.expect_location(loc)
    }
}

#[cfg(test)]
mod tests {
    use crate::{CfaBuilder, Expr, LocationKind};

    #[test]
    fn reverse_postorder_ranks_entry_first() {
        let mut b = CfaBuilder::new();
        let main = b.function("main", &[]).unwrap();
        let a = b.location("main").unwrap();
        let c = b.location("main").unwrap();
        b.blank(main.entry(), a, "a").unwrap();
        b.blank(a, c, "c").unwrap();
        b.blank(c, main.exit(), "exit").unwrap();
        let cfa = b.build("main").unwrap();

        assert_eq!(cfa.reverse_postorder(main.entry()), 0);
        assert!(cfa.reverse_postorder(a) < cfa.reverse_postorder(c));
        assert!(cfa.reverse_postorder(c) < cfa.reverse_postorder(main.exit()));
    }

    #[test]
    fn distance_to_error_counts_edges() {
        let mut b = CfaBuilder::new();
        let main = b.function("main", &[]).unwrap();
        let mid = b.location("main").unwrap();
        let err = b.error_location("main", "assert").unwrap();
        b.blank(main.entry(), mid, "step").unwrap();
        b.assume(mid, err, Expr::var("x").eq(Expr::constant(0)), true)
            .unwrap();
        b.assume(mid, main.exit(), Expr::var("x").eq(Expr::constant(0)), false)
            .unwrap();
        let cfa = b.build("main").unwrap();

        assert_eq!(cfa.distance_to_error(err), Some(0));
        assert_eq!(cfa.distance_to_error(mid), Some(1));
        assert_eq!(cfa.distance_to_error(main.entry()), Some(2));
        assert_eq!(cfa.distance_to_error(main.exit()), None);
        assert_eq!(cfa[err].kind(), &LocationKind::Error("assert".to_string()));
    }

    #[test]
    fn outgoing_edges_keep_insertion_order() {
        let mut b = CfaBuilder::new();
        let main = b.function("main", &[]).unwrap();
        let then_loc = b.location("main").unwrap();
        let else_loc = b.location("main").unwrap();
        let (t, e) = b
            .branch(
                main.entry(),
                then_loc,
                else_loc,
                Expr::var("x").lt(Expr::constant(0)),
            )
            .unwrap();
        let cfa = b.build("main").unwrap();

        let ids: Vec<_> = cfa.outgoing_edges(main.entry()).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![t, e]);
        assert_eq!(cfa.successor(t), Some(then_loc));
        assert_eq!(cfa.predecessor(e), Some(main.entry()));
    }
}
