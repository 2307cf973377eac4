//! Regrouping of a flat departure list into per-direction collections.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{Departure, Direction, DirectionId};

/// Direction lookup by id.
#[derive(Debug, Clone, Default)]
pub struct DirectionIndex {
    by_id: HashMap<DirectionId, Direction>,
}

impl DirectionIndex {
    /// Build the index from direction rows.
    pub fn new(directions: impl IntoIterator<Item = Direction>) -> Self {
        Self {
            by_id: directions.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    pub fn get(&self, id: DirectionId) -> Option<&Direction> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Departures sharing one direction, in store order.
///
/// Never empty: a group only exists because a departure created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionGroup {
    pub direction_id: DirectionId,
    pub direction: Direction,
    pub departures: Vec<Departure>,
}

/// Errors from grouping departures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupingError {
    /// A departure points at a direction missing from the reference data
    #[error("departure {departure} references unknown direction {direction}")]
    UnknownDirection {
        direction: DirectionId,
        departure: i64,
    },
}

/// Partition departures by direction.
///
/// Groups appear in the order their direction is first seen; departures
/// keep their input order inside each group. Same-direction departures do
/// not need to be contiguous in the input.
pub fn group_by_direction(
    departures: impl IntoIterator<Item = Departure>,
    directions: &DirectionIndex,
) -> Result<Vec<DirectionGroup>, GroupingError> {
    let mut groups: Vec<DirectionGroup> = Vec::new();
    let mut slots: HashMap<DirectionId, usize> = HashMap::new();

    for departure in departures {
        let id = departure.direction_id;
        if let Some(&slot) = slots.get(&id) {
            if slot + 1 != groups.len() {
                debug!(direction = %id, departure = departure.id, "non-contiguous direction in departure list");
            }
            groups[slot].departures.push(departure);
            continue;
        }

        let direction = directions
            .get(id)
            .cloned()
            .ok_or(GroupingError::UnknownDirection {
                direction: id,
                departure: departure.id,
            })?;

        slots.insert(id, groups.len());
        groups.push(DirectionGroup {
            direction_id: id,
            direction,
            departures: vec![departure],
        });
    }

    Ok(groups)
}
