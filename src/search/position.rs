//! Points in the search grid.

use crate::error::SearchError;
use crate::obj::Obj;
use crate::parameter::Parameterizable;
use std::collections::BTreeMap;
use std::fmt;

/// Identifies a dimension inside a [`Position`]. Orders by name first, so
/// coordinates iterate and print alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionKey {
    pub name: String,
    pub stage_index: u32,
}

/// Chosen value per dimension. Equality and hashing cover the coordinates
/// only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Position {
    coordinates: BTreeMap<DimensionKey, Obj>,
}

impl Position {
    pub fn new() -> Self {
        Position::default()
    }

    pub fn insert(&mut self, key: DimensionKey, value: Obj) {
        self.coordinates.insert(key, value);
    }

    /// Value chosen for the dimension named `name`, at any stage.
    pub fn get(&self, name: &str) -> Option<&Obj> {
        self.coordinates.iter().find(|(k, _)| k.name == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DimensionKey, &Obj)> {
        self.coordinates.iter()
    }

    /// The coordinates of dimensions that belong to stages `0..=stage`.
    pub fn project(&self, stage: usize) -> Position {
        let coordinates = self
            .coordinates
            .iter()
            .filter(|(k, _)| k.stage_index as usize <= stage)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Position { coordinates }
    }

    /// True when every coordinate of `self` appears in `other` with the same
    /// value. The empty position is a sub-position of everything.
    pub fn is_sub_position_of(&self, other: &Position) -> bool {
        self.coordinates.iter().all(|(k, v)| other.coordinates.get(k) == Some(v))
    }

    /// Set every coordinate as a parameter of `target`.
    pub fn apply_to<P: Parameterizable + ?Sized>(&self, target: &mut P) -> Result<(), SearchError> {
        for (key, value) in &self.coordinates {
            if !target.set_parameter(&key.name, value) {
                return Err(SearchError::ParameterRejected { name: key.name.clone(), value: value.to_string() });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, (key, value)) in self.coordinates.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key.name, value)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str, stage_index: u32) -> DimensionKey {
        DimensionKey { name: name.to_string(), stage_index }
    }

    fn position(coords: &[(&str, u32, &str)]) -> Position {
        let mut p = Position::new();
        for (name, stage, value) in coords {
            p.insert(key(name, *stage), Obj::literal(*value));
        }
        p
    }

    #[test]
    fn projection_keeps_earlier_stages() {
        let full = position(&[("b", 1, "x"), ("a", 0, "1"), ("c", 2, "y")]);
        assert_eq!(full.project(0), position(&[("a", 0, "1")]));
        assert_eq!(full.project(1), position(&[("a", 0, "1"), ("b", 1, "x")]));
        assert_eq!(full.project(5), full);
    }

    #[test]
    fn sub_position_relation() {
        let full = position(&[("a", 0, "1"), ("b", 1, "x")]);
        assert!(Position::new().is_sub_position_of(&full));
        assert!(full.project(0).is_sub_position_of(&full));
        assert!(!position(&[("a", 0, "2")]).is_sub_position_of(&full));
        assert!(!full.is_sub_position_of(&full.project(0)));
    }

    #[test]
    fn display_is_ordered_by_name() {
        let p = position(&[("depth", 1, "4"), ("alpha", 0, "0.1")]);
        assert_eq!(p.to_string(), r#"(alpha="0.1", depth="4")"#);
    }
}
