use slotmap::new_key_type;

new_key_type! {
    /// Identifies a station in the line graph.
    pub struct StationId;

    /// Identifies a directed routing edge in the line graph.
    pub struct EdgeId;

    /// Identifies a unit of work moving through the line. Keys are versioned,
    /// so an id held by a stale event never resolves to a newer entity.
    pub struct EntityId;
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn removed_entity_key_does_not_resolve() {
        let mut map: SlotMap<EntityId, u32> = SlotMap::with_key();
        let a = map.insert(1);
        map.remove(a);
        let b = map.insert(2);
        assert!(map.get(a).is_none());
        assert_eq!(map[b], 2);
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut stations: SlotMap<StationId, ()> = SlotMap::with_key();
        let s = stations.insert(());
        let mut map = HashMap::new();
        map.insert(s, "press");
        assert_eq!(map[&s], "press");
    }
}
