//! Typed value conditions on node and edge features.

use regex::Regex;

use crate::types::FeatureValue;

/// A validated restriction on a feature value.
#[derive(Debug, Clone)]
pub enum ValueCondition {
    /// The feature has a value.
    Present,
    /// The feature has no value.
    Absent,
    /// No restriction at all.
    Any,
    /// The value is one of these.
    OneOf(Vec<FeatureValue>),
    /// The value is none of these; a missing value qualifies.
    NoneOf(Vec<FeatureValue>),
    Less(i64),
    Greater(i64),
    /// The value, as text, contains a match.
    Matches(Regex),
}

impl ValueCondition {
    pub fn accepts(&self, value: Option<&FeatureValue>) -> bool {
        match self {
            ValueCondition::Present => value.is_some(),
            ValueCondition::Absent => value.is_none(),
            ValueCondition::Any => true,
            ValueCondition::OneOf(values) => value.map_or(false, |v| values.contains(v)),
            ValueCondition::NoneOf(values) => value.map_or(true, |v| !values.contains(v)),
            ValueCondition::Less(limit) => value.and_then(FeatureValue::as_int).map_or(false, |v| v < *limit),
            ValueCondition::Greater(limit) => value.and_then(FeatureValue::as_int).map_or(false, |v| v > *limit),
            ValueCondition::Matches(re) => value.map_or(false, |v| match v {
                FeatureValue::Str(s) => re.is_match(s),
                FeatureValue::Int(i) => re.is_match(&i.to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts() {
        let a = FeatureValue::Str("a".into());
        let seven = FeatureValue::Int(7);
        assert!(ValueCondition::Present.accepts(Some(&a)));
        assert!(!ValueCondition::Present.accepts(None));
        assert!(ValueCondition::Absent.accepts(None));
        assert!(ValueCondition::Any.accepts(None));
        assert!(ValueCondition::OneOf(vec![a.clone()]).accepts(Some(&a)));
        assert!(!ValueCondition::OneOf(vec![a.clone()]).accepts(None));
        assert!(ValueCondition::NoneOf(vec![a.clone()]).accepts(None));
        assert!(!ValueCondition::NoneOf(vec![a.clone()]).accepts(Some(&a)));
        assert!(ValueCondition::Less(8).accepts(Some(&seven)));
        assert!(!ValueCondition::Greater(7).accepts(Some(&seven)));
        assert!(ValueCondition::Matches(Regex::new("^7$").unwrap()).accepts(Some(&seven)));
    }
}
