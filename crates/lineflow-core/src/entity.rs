use serde::{Deserialize, Serialize};

use crate::fixed::SimTime;
use crate::id::{EdgeId, StationId};

/// Inspection outcome carried by an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[default]
    Good,
    Defect,
}

/// Lifecycle of an entity. An entity held in a blocked slot has finished
/// service but not left, and stays `Processing`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    #[default]
    Queued,
    Processing,
    Moving,
    Completed,
}

/// Where an entity currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Station(StationId),
    /// On an edge, between departure and arrival.
    Transit {
        edge: EdgeId,
        from: StationId,
        to: StationId,
        departed_at: SimTime,
        arrives_at: SimTime,
    },
}

/// A unit of work moving through the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub created_at: SimTime,
    /// Stations visited, in order, including the current one.
    pub path: Vec<StationId>,
    pub location: Location,
    pub state: EntityState,
    pub classification: Classification,
    pub completed_at: Option<SimTime>,
}

impl Entity {
    pub(crate) fn new(created_at: SimTime, origin: StationId) -> Self {
        Self {
            created_at,
            path: vec![origin],
            location: Location::Station(origin),
            state: EntityState::Queued,
            classification: Classification::Good,
            completed_at: None,
        }
    }

    /// The station the entity sits at, or `None` while in transit.
    pub fn station(&self) -> Option<StationId> {
        match self.location {
            Location::Station(s) => Some(s),
            Location::Transit { .. } => None,
        }
    }

    pub fn is_good(&self) -> bool {
        self.classification == Classification::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::secs;
    use slotmap::SlotMap;

    #[test]
    fn new_entity_starts_queued_at_origin() {
        let mut stations: SlotMap<StationId, ()> = SlotMap::with_key();
        let s = stations.insert(());
        let e = Entity::new(secs(2.0).unwrap(), s);
        assert_eq!(e.station(), Some(s));
        assert_eq!(e.path, vec![s]);
        assert_eq!(e.state, EntityState::Queued);
        assert!(e.is_good());
        assert!(e.completed_at.is_none());
    }
}
