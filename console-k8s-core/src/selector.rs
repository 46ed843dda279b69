//! Label selectors as the console sends and evaluates them
use crate::Error;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

type Map = BTreeMap<String, String>;

/// A single selector requirement
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expression {
    /// The label value is one of the given values
    In(String, BTreeSet<String>),
    /// The label is absent or its value is none of the given values
    NotIn(String, BTreeSet<String>),
    /// The label equals the value
    Equal(String, String),
    /// The label is absent or differs from the value
    NotEqual(String, String),
    /// The label is present
    Exists(String),
    /// The label is absent
    DoesNotExist(String),
    /// The label holds a number greater than the value
    GreaterThan(String, String),
    /// The label holds a number less than the value
    LessThan(String, String),
    /// An operator the console does not understand; never matches and is not serialized
    Invalid,
}

/// A conjunction of [`Expression`]s
///
/// An empty selector selects everything.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct Selector(Vec<Expression>);

impl Selector {
    /// Create a selector from a map of key=value label matches
    pub fn from_map(map: Map) -> Self {
        Self(map.into_iter().map(|(k, v)| Expression::Equal(k, v)).collect())
    }

    /// The requirements of this selector
    pub fn expressions(&self) -> &[Expression] {
        &self.0
    }

    /// Convert a selector to a string for the API
    pub fn to_selector_string(&self) -> String {
        let selectors: Vec<String> = self
            .0
            .iter()
            .filter(|&e| e != &Expression::Invalid)
            .map(|e| e.to_string())
            .collect();
        selectors.join(",")
    }

    /// Indicates whether this label selector matches everything
    pub fn selects_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluate the selector against a set of labels
    pub fn matches(&self, labels: &Map) -> bool {
        self.0.iter().all(|expr| expr.matches(labels))
    }

    /// Extend this selector with the requirements of another
    pub fn extend(&mut self, exprs: impl IntoIterator<Item = Expression>) {
        self.0.extend(exprs)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn joined(values: &BTreeSet<String>) -> String {
            values.iter().cloned().collect::<Vec<_>>().join(",")
        }
        match self {
            Expression::In(key, values) if values.len() == 1 => write!(f, "{key}={}", joined(values)),
            Expression::In(key, values) => write!(f, "{key} in ({})", joined(values)),
            Expression::NotIn(key, values) if values.len() == 1 => write!(f, "{key}!={}", joined(values)),
            Expression::NotIn(key, values) => write!(f, "{key} notin ({})", joined(values)),
            Expression::Equal(key, value) => write!(f, "{key}={value}"),
            Expression::NotEqual(key, value) => write!(f, "{key}!={value}"),
            Expression::Exists(key) => write!(f, "{key}"),
            Expression::DoesNotExist(key) => write!(f, "!{key}"),
            Expression::GreaterThan(key, value) => write!(f, "{key}>{value}"),
            Expression::LessThan(key, value) => write!(f, "{key}<{value}"),
            Expression::Invalid => Ok(()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_selector_string())
    }
}

impl Expression {
    fn matches(&self, labels: &Map) -> bool {
        match self {
            Expression::In(key, values) => match labels.get(key) {
                Some(v) => values.contains(v),
                None => false,
            },
            Expression::NotIn(key, values) => match labels.get(key) {
                Some(v) => !values.contains(v),
                None => true,
            },
            Expression::Exists(key) => labels.contains_key(key),
            Expression::DoesNotExist(key) => !labels.contains_key(key),
            Expression::Equal(key, value) => labels.get(key) == Some(value),
            Expression::NotEqual(key, value) => labels.get(key) != Some(value),
            Expression::GreaterThan(key, value) => compare(labels.get(key), value, |l, r| l > r),
            Expression::LessThan(key, value) => compare(labels.get(key), value, |l, r| l < r),
            Expression::Invalid => false,
        }
    }

    fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        let invalid = || Error::InvalidSelector(raw.to_string());
        if raw.is_empty() {
            return Err(invalid());
        }
        if let Some(key) = raw.strip_prefix('!') {
            return checked_key(key).map(Expression::DoesNotExist).ok_or_else(invalid);
        }
        if let Some((key, values)) = split_set(raw, " notin ") {
            let key = checked_key(key).ok_or_else(invalid)?;
            return Ok(Expression::NotIn(key, parse_set(values).ok_or_else(invalid)?));
        }
        if let Some((key, values)) = split_set(raw, " in ") {
            let key = checked_key(key).ok_or_else(invalid)?;
            return Ok(Expression::In(key, parse_set(values).ok_or_else(invalid)?));
        }
        for (op, build) in [
            ("!=", Expression::NotEqual as fn(String, String) -> Expression),
            ("==", Expression::Equal),
            ("=", Expression::Equal),
            (">", Expression::GreaterThan),
            ("<", Expression::LessThan),
        ] {
            if let Some((key, value)) = raw.split_once(op) {
                let key = checked_key(key).ok_or_else(invalid)?;
                return Ok(build(key, value.trim().to_string()));
            }
        }
        checked_key(raw).map(Expression::Exists).ok_or_else(invalid)
    }
}

fn compare(label: Option<&String>, value: &str, op: impl Fn(f64, f64) -> bool) -> bool {
    match (label.and_then(|l| l.parse::<f64>().ok()), value.parse::<f64>()) {
        (Some(l), Ok(r)) => op(l, r),
        _ => false,
    }
}

fn checked_key(key: &str) -> Option<String> {
    let key = key.trim();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'));
    valid.then(|| key.to_string())
}

fn split_set<'a>(raw: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    let (key, rest) = raw.split_once(op)?;
    Some((key, rest.trim()))
}

fn parse_set(values: &str) -> Option<BTreeSet<String>> {
    let inner = values.strip_prefix('(')?.strip_suffix(')')?;
    let set: BTreeSet<String> = inner
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    (!set.is_empty()).then_some(set)
}

// Split on commas that are not inside a value set
fn split_requirements(raw: &str) -> Result<Vec<&str>, Error> {
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::InvalidSelector(raw.to_string()))?
            }
            ',' if depth == 0 => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::InvalidSelector(raw.to_string()));
    }
    parts.push(&raw[start..]);
    Ok(parts)
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        split_requirements(s)?
            .into_iter()
            .map(Expression::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

// convenience conversions for Selector

impl FromIterator<(String, String)> for Selector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl FromIterator<Expression> for Selector {
    fn from_iter<T: IntoIterator<Item = Expression>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Expression> for Selector {
    fn from(value: Expression) -> Self {
        Self(vec![value])
    }
}

impl From<LabelSelector> for Selector {
    fn from(value: LabelSelector) -> Self {
        let expressions = match value.match_expressions {
            Some(requirements) => requirements.into_iter().map(Into::into).collect(),
            None => vec![],
        };
        let mut equality: Selector = value
            .match_labels
            .map(|labels| labels.into_iter().collect())
            .unwrap_or_default();
        equality.0.extend(expressions);
        equality
    }
}

impl From<LabelSelectorRequirement> for Expression {
    fn from(requirement: LabelSelectorRequirement) -> Self {
        let key = requirement.key;
        let values: Option<BTreeSet<String>> = requirement.values.map(|values| values.into_iter().collect());
        let single = |values: Option<BTreeSet<String>>| values.and_then(|v| v.into_iter().next());
        match requirement.operator.as_str() {
            "In" => match values {
                Some(values) => Expression::In(key, values),
                None => Expression::Invalid,
            },
            "NotIn" => match values {
                Some(values) => Expression::NotIn(key, values),
                None => Expression::Invalid,
            },
            "Equals" => single(values).map_or(Expression::Invalid, |v| Expression::Equal(key, v)),
            "NotEquals" => single(values).map_or(Expression::Invalid, |v| Expression::NotEqual(key, v)),
            "GreaterThan" | "Gt" => single(values).map_or(Expression::Invalid, |v| Expression::GreaterThan(key, v)),
            "LessThan" | "Lt" => single(values).map_or(Expression::Invalid, |v| Expression::LessThan(key, v)),
            "Exists" => Expression::Exists(key),
            "DoesNotExist" => Expression::DoesNotExist(key),
            _ => Expression::Invalid,
        }
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_selector_string())
    }
}

// The console passes selectors either as a selector string, a `LabelSelector`,
// or a bare map of labels.
#[derive(Deserialize)]
#[serde(untagged)]
enum SelectorRepr {
    Text(String),
    Structured(StructuredSelector),
    Labels(Map),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StructuredSelector {
    #[serde(default)]
    match_labels: Option<Map>,
    #[serde(default)]
    match_expressions: Option<Vec<LabelSelectorRequirement>>,
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SelectorRepr::deserialize(deserializer)? {
            SelectorRepr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            SelectorRepr::Structured(s) => Ok(LabelSelector {
                match_labels: s.match_labels,
                match_expressions: s.match_expressions,
            }
            .into()),
            SelectorRepr::Labels(labels) => Ok(Selector::from_map(labels)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels(pairs: &[(&str, &str)]) -> Map {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_raw_matches() {
        for (selector, labels, matches, msg) in &[
            (Selector::default(), Map::default(), true, "empty match"),
            (
                Selector::from_iter(Some(("foo", "bar"))),
                labels(&[("foo", "bar")]),
                true,
                "exact label match",
            ),
            (
                Selector::from_iter(Some(("foo", "bar"))),
                labels(&[("foo", "bar"), ("bah", "baz")]),
                true,
                "sufficient label match",
            ),
            (
                Selector::from_iter(Some(Expression::In(
                    "foo".into(),
                    ["bar".to_string(), "baz".to_string()].into(),
                ))),
                labels(&[("foo", "baz")]),
                true,
                "in set match",
            ),
            (
                Selector::from_iter(Some(Expression::NotIn("foo".into(), ["bar".to_string()].into()))),
                labels(&[]),
                true,
                "notin matches absent label",
            ),
            (
                Selector::from_iter(Some(Expression::DoesNotExist("foo".into()))),
                labels(&[("foo", "bar")]),
                false,
                "does not exist fails on present label",
            ),
            (
                Selector::from_iter(Some(Expression::GreaterThan("replicas".into(), "2".into()))),
                labels(&[("replicas", "3")]),
                true,
                "numeric greater than",
            ),
            (
                Selector::from_iter(Some(Expression::LessThan("replicas".into(), "2".into()))),
                labels(&[("replicas", "many")]),
                false,
                "non numeric never compares",
            ),
        ] {
            assert_eq!(selector.matches(labels), *matches, "{}", msg);
        }
    }

    #[test]
    fn string_form_of_every_operator() {
        let selector = Selector::from_iter(vec![
            Expression::Equal("app".into(), "web".into()),
            Expression::NotEqual("tier".into(), "db".into()),
            Expression::In("env".into(), ["prod".to_string(), "qa".to_string()].into()),
            Expression::In("zone".into(), ["a".to_string()].into()),
            Expression::NotIn("team".into(), ["x".to_string(), "y".to_string()].into()),
            Expression::Exists("managed".into()),
            Expression::DoesNotExist("legacy".into()),
            Expression::GreaterThan("gen".into(), "1".into()),
            Expression::LessThan("gen".into(), "9".into()),
            Expression::Invalid,
        ]);
        assert_eq!(
            selector.to_selector_string(),
            "app=web,tier!=db,env in (prod,qa),zone=a,team notin (x,y),managed,!legacy,gen>1,gen<9"
        );
    }

    #[test]
    fn parse_roundtrips_through_display() {
        let raw = "app=web,env in (prod,qa),team notin (x,y),managed,!legacy,tier!=db";
        let selector: Selector = raw.parse().unwrap();
        assert_eq!(selector.expressions().len(), 6);
        assert_eq!(selector.to_selector_string(), raw);
        assert_eq!(
            "a==b".parse::<Selector>().unwrap(),
            Selector::from_iter(Some(("a", "b")))
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("app in (web".parse::<Selector>().is_err());
        assert!("app=web,,tier=db".parse::<Selector>().is_err());
        assert!("=web".parse::<Selector>().is_err());
        assert!("".parse::<Selector>().unwrap().selects_all());
    }

    #[test]
    fn label_selector_conversion() {
        let ls = LabelSelector {
            match_labels: Some(labels(&[("app", "web")])),
            match_expressions: Some(vec![
                LabelSelectorRequirement {
                    key: "env".into(),
                    operator: "In".into(),
                    values: Some(vec!["qa".into(), "prod".into()]),
                },
                LabelSelectorRequirement {
                    key: "legacy".into(),
                    operator: "DoesNotExist".into(),
                    values: None,
                },
                LabelSelectorRequirement {
                    key: "broken".into(),
                    operator: "In".into(),
                    values: None,
                },
            ]),
        };
        let selector = Selector::from(ls);
        assert_eq!(selector.to_selector_string(), "app=web,env in (prod,qa),!legacy");
    }

    #[test]
    fn deserializes_every_console_shape() {
        let text: Selector = serde_json::from_value(json!("app=web")).unwrap();
        let structured: Selector = serde_json::from_value(json!({"matchLabels": {"app": "web"}})).unwrap();
        let bare: Selector = serde_json::from_value(json!({"app": "web"})).unwrap();
        assert_eq!(text, structured);
        assert_eq!(structured, bare);
        assert_eq!(serde_json::to_value(&bare).unwrap(), json!("app=web"));
    }
}
