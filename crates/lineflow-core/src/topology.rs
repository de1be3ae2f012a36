//! The line graph: stations connected by directed routing edges.
//!
//! Built once from a [`LineDescriptor`]. Forward adjacency (outgoing edges in
//! declaration order) drives routing; the reverse index (distinct upstream
//! stations) drives unblock notification. Both are precomputed at build time
//! and never change while the simulator runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

use crate::id::{EdgeId, StationId};
use crate::station::{ConfigError, StationDescriptor, StationSpec};

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// A directed routing edge between two station ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDescriptor {
    pub source: String,
    pub target: String,
}

impl EdgeDescriptor {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A full line as handed over by the caller: stations plus edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineDescriptor {
    #[serde(default)]
    pub stations: Vec<StationDescriptor>,
    #[serde(default)]
    pub edges: Vec<EdgeDescriptor>,
}

impl LineDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn station(mut self, station: StationDescriptor) -> Self {
        self.stations.push(station);
        self
    }

    pub fn edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.edges.push(EdgeDescriptor::new(source, target));
        self
    }
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// Per-edge data stored in the line graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub from: StationId,
    pub to: StationId,
}

/// Adjacency lists for a single station.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StationAdjacency {
    /// Edges whose source is this station, in declaration order.
    outputs: Vec<EdgeId>,
    /// Distinct stations with an edge into this one, in declaration order.
    upstream: Vec<StationId>,
}

/// The validated line graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineGraph {
    stations: SlotMap<StationId, StationSpec>,
    edges: SlotMap<EdgeId, EdgeData>,
    adjacency: SecondaryMap<StationId, StationAdjacency>,
    names: HashMap<String, StationId>,
    /// Stations in declaration order.
    order: Vec<StationId>,
}

impl LineGraph {
    /// Validate a descriptor and build the graph with both routing indices.
    pub fn build(descriptor: &LineDescriptor) -> Result<Self, ConfigError> {
        let mut stations = SlotMap::with_key();
        let mut adjacency = SecondaryMap::new();
        let mut names = HashMap::with_capacity(descriptor.stations.len());
        let mut order = Vec::with_capacity(descriptor.stations.len());

        for desc in &descriptor.stations {
            let spec = desc.validate()?;
            if names.contains_key(&spec.name) {
                return Err(ConfigError::DuplicateStation(spec.name));
            }
            let name = spec.name.clone();
            let id = stations.insert(spec);
            adjacency.insert(id, StationAdjacency::default());
            names.insert(name, id);
            order.push(id);
        }

        let mut edges = SlotMap::with_key();
        for e in &descriptor.edges {
            let resolve = |name: &str| {
                names
                    .get(name)
                    .copied()
                    .ok_or_else(|| ConfigError::UnknownStation {
                        from: e.source.clone(),
                        to: e.target.clone(),
                        missing: name.to_string(),
                    })
            };
            let from = resolve(&e.source)?;
            let to = resolve(&e.target)?;
            let edge = edges.insert(EdgeData { from, to });

            if let Some(adj) = adjacency.get_mut(from) {
                adj.outputs.push(edge);
            }
            if let Some(adj) = adjacency.get_mut(to) {
                if !adj.upstream.contains(&from) {
                    adj.upstream.push(from);
                }
            }
        }

        Ok(Self {
            stations,
            edges,
            adjacency,
            names,
            order,
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn station(&self, id: StationId) -> Option<&StationSpec> {
        self.stations.get(id)
    }

    /// Resolve a caller station id to its key.
    pub fn station_id(&self, name: &str) -> Option<StationId> {
        self.names.get(name).copied()
    }

    /// Station name for a key, or an empty string for an unknown key.
    pub fn name(&self, id: StationId) -> &str {
        self.stations.get(id).map_or("", |s| s.name.as_str())
    }

    /// Stations in declaration order.
    pub fn stations(&self) -> impl Iterator<Item = (StationId, &StationSpec)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.stations.get(id).map(|s| (id, s)))
    }

    pub fn station_ids(&self) -> &[StationId] {
        &self.order
    }

    pub fn edge(&self, id: EdgeId) -> Option<&EdgeData> {
        self.edges.get(id)
    }

    /// All edges (unordered).
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> + '_ {
        self.edges.iter()
    }

    /// Outgoing edges of a station in declaration order.
    pub fn outputs(&self, id: StationId) -> &[EdgeId] {
        self.adjacency
            .get(id)
            .map_or(&[][..], |adj| adj.outputs.as_slice())
    }

    /// Distinct upstream neighbours of a station (the reverse index).
    pub fn upstream(&self, id: StationId) -> &[StationId] {
        self.adjacency
            .get(id)
            .map_or(&[][..], |adj| adj.upstream.as_slice())
    }

    /// The first outgoing edge.
    pub fn primary_edge(&self, id: StationId) -> Option<EdgeId> {
        self.outputs(id).first().copied()
    }

    /// The second outgoing edge, used for rework by Quality stations.
    pub fn rework_edge(&self, id: StationId) -> Option<EdgeId> {
        self.outputs(id).get(1).copied()
    }

    pub fn contains_station(&self, id: StationId) -> bool {
        self.stations.contains_key(id)
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::StationKind;

    fn line() -> LineDescriptor {
        LineDescriptor::new()
            .station(StationDescriptor::new("src", StationKind::Source, 5.0))
            .station(StationDescriptor::new("a", StationKind::Process, 4.0))
            .station(StationDescriptor::new("b", StationKind::Process, 4.0))
            .station(StationDescriptor::new("ship", StationKind::Shipping, 1.0))
            .edge("src", "a")
            .edge("src", "b")
            .edge("a", "ship")
            .edge("b", "ship")
    }

    #[test]
    fn builds_forward_and_reverse_indices() {
        let graph = LineGraph::build(&line()).unwrap();
        let src = graph.station_id("src").unwrap();
        let a = graph.station_id("a").unwrap();
        let b = graph.station_id("b").unwrap();
        let ship = graph.station_id("ship").unwrap();

        let targets: Vec<StationId> = graph
            .outputs(src)
            .iter()
            .map(|&e| graph.edge(e).unwrap().to)
            .collect();
        assert_eq!(targets, vec![a, b]);
        assert_eq!(graph.upstream(ship), &[a, b]);
        assert_eq!(graph.upstream(a), &[src]);
        assert!(graph.upstream(src).is_empty());
        assert!(graph.outputs(ship).is_empty());
    }

    #[test]
    fn primary_and_rework_edges_follow_declaration_order() {
        let graph = LineGraph::build(&line()).unwrap();
        let src = graph.station_id("src").unwrap();
        let primary = graph.primary_edge(src).unwrap();
        let rework = graph.rework_edge(src).unwrap();
        assert_eq!(graph.name(graph.edge(primary).unwrap().to), "a");
        assert_eq!(graph.name(graph.edge(rework).unwrap().to), "b");
    }

    #[test]
    fn unknown_edge_endpoint_is_rejected() {
        let desc = line().edge("a", "nowhere");
        let err = LineGraph::build(&desc).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownStation {
                from: "a".into(),
                to: "nowhere".into(),
                missing: "nowhere".into(),
            }
        );
    }

    #[test]
    fn duplicate_station_is_rejected() {
        let desc = line().station(StationDescriptor::new("a", StationKind::Process, 1.0));
        let err = LineGraph::build(&desc).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateStation("a".into()));
    }

    #[test]
    fn parallel_edges_keep_single_upstream_entry() {
        let desc = LineDescriptor::new()
            .station(StationDescriptor::new("a", StationKind::Process, 1.0))
            .station(StationDescriptor::new("b", StationKind::Process, 1.0))
            .edge("a", "b")
            .edge("a", "b");
        let graph = LineGraph::build(&desc).unwrap();
        let a = graph.station_id("a").unwrap();
        let b = graph.station_id("b").unwrap();
        assert_eq!(graph.outputs(a).len(), 2);
        assert_eq!(graph.upstream(b), &[a]);
    }

    #[test]
    fn stations_iterate_in_declaration_order() {
        let graph = LineGraph::build(&line()).unwrap();
        let names: Vec<&str> = graph.stations().map(|(_, s)| s.name.as_str()).collect();
        assert_eq!(names, vec!["src", "a", "b", "ship"]);
        assert_eq!(graph.station_count(), 4);
        assert_eq!(graph.edge_count(), 4);
    }
}
