//! Search dimensions.

use super::position::DimensionKey;
use crate::error::SearchError;
use crate::obj::{Array, Function, Obj};
use std::collections::BTreeMap;

/// Function name of a dimension in scripts.
pub const DIMENSION: &str = "Dimension";

/// Type tag of the only dimension kind grid enumeration supports.
pub const ENUMERATED: &str = "ENUMERATED";

#[derive(Debug, Clone, PartialEq)]
pub enum DimensionKind {
    /// A fixed list of candidate values.
    Enumerated(Array),
    /// Any other declared type (`type=RANGE`, ...). Kept so scripts load, but
    /// a grid containing one cannot be built.
    Declared(String),
}

/// One searchable parameter.
///
/// `sub_dimensions` maps an index into this dimension's values to the
/// dimensions that only exist when that value is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub reference_name: String,
    pub stage_index: u32,
    pub parent_value_index: Option<u32>,
    pub kind: DimensionKind,
    pub sub_dimensions: BTreeMap<u32, Vec<Dimension>>,
}

impl Dimension {
    pub fn enumerated(reference_name: impl Into<String>, stage_index: u32, values: Array) -> Self {
        Dimension {
            reference_name: reference_name.into(),
            stage_index,
            parent_value_index: None,
            kind: DimensionKind::Enumerated(values),
            sub_dimensions: BTreeMap::new(),
        }
    }

    /// Attach `child` under the value at `value_index`.
    pub fn with_sub_dimension(mut self, value_index: u32, mut child: Dimension) -> Self {
        child.parent_value_index = Some(value_index);
        self.sub_dimensions.entry(value_index).or_default().push(child);
        self
    }

    pub fn key(&self) -> DimensionKey {
        DimensionKey { name: self.reference_name.clone(), stage_index: self.stage_index }
    }

    /// Candidate values, if the dimension is enumerated.
    pub fn values(&self) -> Option<&Array> {
        match &self.kind {
            DimensionKind::Enumerated(values) => Some(values),
            DimensionKind::Declared(_) => None,
        }
    }

    /// Dimensions conditioned on the value at `value_index`.
    pub fn conditioned_on(&self, value_index: u32) -> &[Dimension] {
        self.sub_dimensions.get(&value_index).map(Vec::as_slice).unwrap_or_default()
    }

    /// This dimension and every nested one, depth first.
    pub fn walk(&self) -> Vec<&Dimension> {
        let mut out = vec![self];
        for children in self.sub_dimensions.values() {
            for child in children {
                out.extend(child.walk());
            }
        }
        out
    }

    /// Read a dimension from its script form:
    ///
    /// ```text
    /// Dimension(name="model", stage="0", values=("tree", "linear")) {
    ///     depth=Dimension(name="depth", stage="1", parent="0", values=("2", "4"));
    /// }
    /// ```
    ///
    /// `stage` defaults to 0 and `type` to `ENUMERATED`. Internal assignments
    /// are child dimensions; `parent` indexes the enclosing dimension's values.
    pub fn from_obj(obj: &Obj) -> Result<Self, SearchError> {
        let function = obj
            .as_function()
            .filter(|f| f.name == DIMENSION)
            .ok_or_else(|| invalid(format!("expected {DIMENSION}(...), found {obj}")))?;

        let reference_name = text_param(function, "name")?.ok_or_else(|| invalid("missing 'name'"))?;
        let stage_index = match text_param(function, "stage")? {
            Some(stage) => stage.parse().map_err(|_| invalid(format!("'{reference_name}': bad stage '{stage}'")))?,
            None => 0,
        };
        let parent_value_index = match text_param(function, "parent")? {
            Some(parent) => {
                Some(parent.parse().map_err(|_| invalid(format!("'{reference_name}': bad parent '{parent}'")))?)
            }
            None => None,
        };

        let type_tag = text_param(function, "type")?.unwrap_or_else(|| ENUMERATED.to_string());
        let kind = if type_tag == ENUMERATED {
            let values = function
                .param("values")
                .and_then(Obj::as_array)
                .ok_or_else(|| invalid(format!("'{reference_name}': enumerated dimension needs values=(...)")))?;
            DimensionKind::Enumerated(values.clone())
        } else {
            DimensionKind::Declared(type_tag)
        };

        let mut dimension =
            Dimension { reference_name, stage_index, parent_value_index, kind, sub_dimensions: BTreeMap::new() };

        if let Some(internal) = &function.internal {
            for child in internal.values() {
                let child = Dimension::from_obj(child)?;
                let Some(index) = child.parent_value_index else {
                    return Err(invalid(format!("'{}': nested dimension needs 'parent'", child.reference_name)));
                };
                let in_range = dimension.values().is_some_and(|v| (index as usize) < v.len());
                if !in_range {
                    return Err(invalid(format!(
                        "'{}': parent index {index} out of range for '{}'",
                        child.reference_name, dimension.reference_name
                    )));
                }
                dimension.sub_dimensions.entry(index).or_default().push(child);
            }
        }
        Ok(dimension)
    }
}

fn text_param(function: &Function, name: &str) -> Result<Option<String>, SearchError> {
    match function.param(name) {
        None => Ok(None),
        Some(obj) => obj
            .match_value()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| invalid(format!("'{name}' must be a plain value, found {obj}"))),
    }
}

fn invalid(message: impl Into<String>) -> SearchError {
    SearchError::InvalidDimension { message: message.into() }
}
