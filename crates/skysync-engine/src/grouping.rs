use std::collections::HashMap;

use skysync_core::Location;

/// The locations sharing one primary source within a batch. Transient:
/// created fresh per batch and discarded after the fetch phase.
#[derive(Debug, Clone)]
pub struct SourceGroup {
    pub source_id: String,
    pub locations: Vec<Location>,
}

/// Partitions `locations` into disjoint groups keyed by primary source id.
///
/// Pure: preserves first-seen group order and the relative order of
/// locations within each group. Does not deduplicate or validate source
/// ids — an unknown id simply becomes its own group, rejected later by
/// source dispatch.
#[must_use]
pub fn group_by_source(locations: Vec<Location>) -> Vec<SourceGroup> {
    let mut groups: Vec<SourceGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for location in locations {
        let source_id = location.weather_source.clone();
        match index.get(&source_id) {
            Some(&i) => groups[i].locations.push(location),
            None => {
                index.insert(source_id.clone(), groups.len());
                groups.push(SourceGroup {
                    source_id,
                    locations: vec![location],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use skysync_core::SecondarySources;

    use super::*;

    fn location(id: &str, source: &str) -> Location {
        Location {
            formatted_id: id.to_string(),
            display_name: id.to_string(),
            latitude: 10.0,
            longitude: 20.0,
            is_current_position: false,
            weather_source: source.to_string(),
            secondary_sources: SecondarySources::default(),
            weather: None,
        }
    }

    #[test]
    fn groups_by_source_preserving_order() {
        let groups = group_by_source(vec![
            location("a", "openmeteo"),
            location("b", "dwd"),
            location("c", "openmeteo"),
            location("d", "dwd"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].source_id, "openmeteo");
        assert_eq!(
            groups[0]
                .locations
                .iter()
                .map(|l| l.formatted_id.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "c"]
        );
        assert_eq!(groups[1].source_id, "dwd");
        assert_eq!(
            groups[1]
                .locations
                .iter()
                .map(|l| l.formatted_id.as_str())
                .collect::<Vec<_>>(),
            vec!["b", "d"]
        );
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_source(Vec::new()).is_empty());
    }

    #[test]
    fn unknown_source_id_becomes_its_own_group() {
        let groups = group_by_source(vec![location("a", "no-such-source")]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].source_id, "no-such-source");
    }
}
