use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    error::{VitricError, VitricResult},
    value::ParamValue,
};

pub const PORT_INPUT: &str = "input";
pub const PORT_OUTPUT: &str = "output";
pub const PORT_AUX: &str = "aux";

// Brands every graph (and the handles it mints) so a handle from one
// builder run can never alias a unit of another.
static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Stable handle to a unit owned by one [`EffectGraph`]. A handle carries the
/// brand of the graph that minted it; lookups against any other graph fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct UnitId {
    graph: u64,
    index: u32,
}

impl UnitId {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// One instantiated primitive: its schema key, registry type name, and the
/// current parameter values (registry defaults overlaid with schema and
/// redirected values).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PrimitiveUnit {
    pub key: String,
    pub type_name: String,
    pub params: BTreeMap<String, ParamValue>,
}

impl PrimitiveUnit {
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }
}

/// Directed connection from a named output port to a named input port.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub src: UnitId,
    pub src_port: String,
    pub dst: UnitId,
    pub dst_port: String,
}

impl Edge {
    pub fn new(src: UnitId, src_port: &str, dst: UnitId, dst_port: &str) -> Self {
        Self {
            src,
            src_port: src_port.to_string(),
            dst,
            dst_port: dst_port.to_string(),
        }
    }
}

/// Owns the units and edges of one effect instance. Units are created once
/// and never removed; edges may be re-established at any time (relink).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EffectGraph {
    brand: u64,
    units: Vec<PrimitiveUnit>,
    edges: Vec<Edge>,
}

impl Default for EffectGraph {
    fn default() -> Self {
        Self {
            brand: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            units: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl EffectGraph {
    pub fn add_unit(&mut self, unit: PrimitiveUnit) -> UnitId {
        let id = UnitId {
            graph: self.brand,
            index: self.units.len() as u32,
        };
        self.units.push(unit);
        id
    }

    pub fn unit(&self, id: UnitId) -> Option<&PrimitiveUnit> {
        if id.graph != self.brand {
            return None;
        }
        self.units.get(id.index())
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut PrimitiveUnit> {
        if id.graph != self.brand {
            return None;
        }
        self.units.get_mut(id.index())
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &PrimitiveUnit)> {
        let brand = self.brand;
        self.units.iter().enumerate().map(move |(i, u)| {
            (
                UnitId {
                    graph: brand,
                    index: i as u32,
                },
                u,
            )
        })
    }

    pub fn contains(&self, id: UnitId) -> bool {
        id.graph == self.brand && id.index() < self.units.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Connects `src`'s output port to `dst`'s input port. An input port
    /// accepts at most one incoming edge; reconnecting a wired port replaces
    /// the previous edge, and re-establishing an identical edge is a no-op.
    pub fn connect(
        &mut self,
        src: UnitId,
        src_port: &str,
        dst: UnitId,
        dst_port: &str,
    ) -> VitricResult<()> {
        if !self.contains(src) {
            return Err(VitricError::dangling_edge(format!(
                "source unit {src:?} does not exist"
            )));
        }
        if !self.contains(dst) {
            return Err(VitricError::dangling_edge(format!(
                "destination unit {dst:?} does not exist"
            )));
        }
        let edge = Edge::new(src, src_port, dst, dst_port);
        if let Some(existing) = self
            .edges
            .iter_mut()
            .find(|e| e.dst == dst && e.dst_port == dst_port)
        {
            *existing = edge;
        } else {
            self.edges.push(edge);
        }
        Ok(())
    }

    /// Verifies the current edge set is acyclic (ports are irrelevant here;
    /// any edge counts as unit-level reachability).
    pub fn check_acyclic(&self) -> VitricResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Grey,
            Black,
        }

        let mut marks = vec![Mark::White; self.units.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); self.units.len()];
        for e in &self.edges {
            successors[e.src.index()].push(e.dst.index());
        }

        // Iterative DFS; a grey node reached again closes a cycle.
        for start in 0..self.units.len() {
            if marks[start] != Mark::White {
                continue;
            }
            let mut stack = vec![(start, 0usize)];
            marks[start] = Mark::Grey;
            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                if frame.1 < successors[node].len() {
                    let succ = successors[node][frame.1];
                    frame.1 += 1;
                    match marks[succ] {
                        Mark::White => {
                            marks[succ] = Mark::Grey;
                            stack.push((succ, 0));
                        }
                        Mark::Grey => {
                            return Err(VitricError::cycle_detected(format!(
                                "unit '{}' is reachable from itself",
                                self.units[succ].key
                            )));
                        }
                        Mark::Black => {}
                    }
                } else {
                    marks[node] = Mark::Black;
                    stack.pop();
                }
            }
        }
        Ok(())
    }
}
