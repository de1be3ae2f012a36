//! On-disk format of a line description.
//!
//! Stations and edges use the core descriptor types directly so a file
//! round-trips without loss. Every section may be omitted.

use lineflow_core::config::SimConfig;
use lineflow_core::station::StationDescriptor;
use lineflow_core::topology::{EdgeDescriptor, LineDescriptor};
use serde::{Deserialize, Serialize};

/// A complete line file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineFile {
    #[serde(default)]
    pub settings: SimConfig,
    #[serde(default)]
    pub stations: Vec<StationDescriptor>,
    #[serde(default)]
    pub edges: Vec<EdgeDescriptor>,
}

impl LineFile {
    pub fn from_parts(descriptor: LineDescriptor, settings: SimConfig) -> Self {
        Self {
            settings,
            stations: descriptor.stations,
            edges: descriptor.edges,
        }
    }

    /// Split into the topology and the engine settings.
    pub fn into_parts(self) -> (LineDescriptor, SimConfig) {
        (
            LineDescriptor {
                stations: self.stations,
                edges: self.edges,
            },
            self.settings,
        )
    }

    pub fn descriptor(&self) -> LineDescriptor {
        LineDescriptor {
            stations: self.stations.clone(),
            edges: self.edges.clone(),
        }
    }
}
