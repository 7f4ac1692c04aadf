//! Grid enumeration.
//!
//! ```text
//! model=(tree, linear)          positions
//!   tree   -> depth=(2, 4)      (model=tree,   depth=2)
//!   linear -> (none)            (model=tree,   depth=4)
//!                               (model=linear)
//! ```
//!
//! Every top-level dimension is crossed with the positions built so far; a
//! value's conditioned sub-dimensions are expanded before moving on.

use super::dimension::Dimension;
use super::position::Position;
use crate::error::SearchError;
use crate::obj::Obj;

/// All positions of a set of dimensions, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchGrid {
    positions: Vec<Position>,
}

impl SearchGrid {
    /// Enumerate every position reachable from `start` (the empty position
    /// when None).
    ///
    /// Fails on the first dimension that is not enumerated.
    pub fn construct(dimensions: &[Dimension], start: Option<&Position>) -> Result<Self, SearchError> {
        let seed = start.cloned().unwrap_or_default();
        let positions = expand(dimensions, vec![seed])?;
        tracing::debug!(dimensions = dimensions.len(), positions = positions.len(), "grid constructed");
        Ok(SearchGrid { positions })
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn into_positions(self) -> Vec<Position> {
        self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn expand(dimensions: &[Dimension], mut partials: Vec<Position>) -> Result<Vec<Position>, SearchError> {
    for dimension in dimensions {
        let values = dimension
            .values()
            .ok_or_else(|| SearchError::UnsupportedDimension { name: dimension.reference_name.clone() })?;

        let mut next = Vec::with_capacity(partials.len() * values.len());
        for partial in &partials {
            for (idx, value) in values.items.iter().enumerate() {
                let mut position = partial.clone();
                position.insert(dimension.key(), Obj::Value(value.clone()));
                let conditioned = u32::try_from(idx).map(|i| dimension.conditioned_on(i)).unwrap_or_default();
                if conditioned.is_empty() {
                    next.push(position);
                } else {
                    next.extend(expand(conditioned, vec![position])?);
                }
            }
        }
        partials = next;
    }
    Ok(partials)
}
