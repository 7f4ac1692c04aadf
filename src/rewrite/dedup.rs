//! Deduplication keys for rule saturation.
//!
//! Saturation adds every rule output to the fact base and applies the rules
//! again. Without a stable notion of "already known" the loop would never
//! reach a fixpoint, so facts are keyed by their canonical serialization.
//! Two facts with the same key are the same fact, whichever rule or pass
//! produced them.

use crate::obj::Obj;

/// Canonical identity of a fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactKey(String);

impl FactKey {
    pub fn from_obj(obj: &Obj) -> Self {
        FactKey(obj.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_obj;

    #[test]
    fn equal_trees_share_a_key() {
        let a = parse_obj(r#"F(x=bare)"#).unwrap();
        let b = parse_obj(r#"F(x="bare")"#).unwrap();
        assert_eq!(FactKey::from_obj(&a), FactKey::from_obj(&b));
        assert_ne!(FactKey::from_obj(&a), FactKey::from_obj(&parse_obj("F(y=bare)").unwrap()));
    }
}
