//! Codec for compound entity keys embedded in cell-control event fragments.
//!
//! Control events reference store entities with textual fragments of the
//! form `Entity(key)` or `Entity(key)/NavProp(key2)`, where `key` is either
//! a bare quoted value (`'rule1'`) or a comma-separated list of
//! `name='value'` pairs (`Name='rule1',_Box.Name='box1'`). This crate
//! extracts and parses those keys, and carries the dummy-key placeholder
//! discipline that lets compound keys with `null` components round-trip
//! through the textual form.

use thiserror::Error;

/// Sentinel substituted for the literal `null` inside compound keys.
///
/// A component carrying this value reads back as absent through
/// [`EntityKey::single_value`] and [`EntityKey::complex_value`].
pub const DUMMY_KEY: &str = "dummy@";

/// Failures while extracting or parsing a key fragment.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum KeyParseError {
    #[error("fragment {0:?} has no key at the requested position")]
    MissingKey(String),
    #[error("key is empty")]
    Empty,
    #[error("value {0:?} is not quoted")]
    UnquotedValue(String),
    #[error("component {0:?} is not a name='value' pair")]
    MalformedPair(String),
    #[error("unterminated quote in {0:?}")]
    UnterminatedQuote(String),
}

/// A parsed entity key: a bare value or a list of named components.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EntityKey {
    Single(String),
    Complex(Vec<(String, String)>),
}

impl EntityKey {
    /// Builds a complex key from named components, substituting the dummy
    /// sentinel for absent values.
    pub fn complex<I, N>(components: I) -> Self
    where
        I: IntoIterator<Item = (N, Option<String>)>,
        N: Into<String>,
    {
        EntityKey::Complex(
            components
                .into_iter()
                .map(|(name, value)| (name.into(), value.unwrap_or_else(|| DUMMY_KEY.to_string())))
                .collect(),
        )
    }

    /// Parses a key, with or without its surrounding parentheses.
    pub fn parse(raw: &str) -> Result<Self, KeyParseError> {
        let trimmed = raw.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed)
            .trim();
        if inner.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let components = split_components(inner)?;
        if components.len() == 1 && !components[0].contains('=') {
            return Ok(EntityKey::Single(parse_value(&components[0])?));
        }

        let mut pairs = Vec::with_capacity(components.len());
        for component in components {
            let (name, value) = component
                .split_once('=')
                .ok_or_else(|| KeyParseError::MalformedPair(component.clone()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(KeyParseError::MalformedPair(component.clone()));
            }
            pairs.push((name.to_string(), parse_value(value)?));
        }
        Ok(EntityKey::Complex(pairs))
    }

    /// Extracts and parses the first key of a fragment (`Entity(key)…`).
    pub fn first_from_fragment(fragment: &str) -> Result<Self, KeyParseError> {
        Self::from_fragment_at(fragment, 1)
    }

    /// Extracts and parses the second key of a fragment
    /// (`Entity(key)/NavProp(key2)`).
    pub fn second_from_fragment(fragment: &str) -> Result<Self, KeyParseError> {
        Self::from_fragment_at(fragment, 3)
    }

    fn from_fragment_at(fragment: &str, part: usize) -> Result<Self, KeyParseError> {
        let parts = split_parens(fragment, part + 2);
        if parts.len() <= part {
            return Err(KeyParseError::MissingKey(fragment.to_string()));
        }
        Self::parse(parts[part])
    }

    /// The bare value of a single key; `None` for complex keys and for the
    /// dummy sentinel.
    pub fn single_value(&self) -> Option<&str> {
        match self {
            EntityKey::Single(value) if value != DUMMY_KEY => Some(value),
            _ => None,
        }
    }

    /// The value of a named component; `None` for single keys, unknown
    /// names, and components carrying the dummy sentinel.
    pub fn complex_value(&self, field: &str) -> Option<&str> {
        match self {
            EntityKey::Single(_) => None,
            EntityKey::Complex(pairs) => pairs
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, value)| value.as_str())
                .filter(|value| *value != DUMMY_KEY),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKey::Single(value) => write!(f, "('{value}')"),
            EntityKey::Complex(pairs) => {
                write!(f, "(")?;
                for (i, (name, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{name}='{value}'")?;
                }
                write!(f, ")")
            }
        }
    }
}

// Splits on '(' and ')' like a limited character-class split: at most
// `limit` resulting parts, with the unsplit remainder in the last one.
fn split_parens(fragment: &str, limit: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = fragment;
    while parts.len() + 1 < limit {
        match rest.find(['(', ')']) {
            Some(at) => {
                parts.push(&rest[..at]);
                rest = &rest[at + 1..];
            }
            None => break,
        }
    }
    parts.push(rest);
    parts
}

// Splits key components on commas outside quotes.
fn split_components(inner: &str) -> Result<Vec<String>, KeyParseError> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    for ch in inner.chars() {
        match ch {
            '\'' => {
                in_quote = !in_quote;
                current.push(ch);
            }
            ',' if !in_quote => {
                components.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if in_quote {
        return Err(KeyParseError::UnterminatedQuote(inner.to_string()));
    }
    components.push(current);
    Ok(components)
}

// A value is a quoted string or the literal `null`, which maps to the
// dummy sentinel.
fn parse_value(raw: &str) -> Result<String, KeyParseError> {
    let trimmed = raw.trim();
    if trimmed == "null" {
        return Ok(DUMMY_KEY.to_string());
    }
    trimmed
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .map(|value| value.to_string())
        .ok_or_else(|| KeyParseError::UnquotedValue(raw.to_string()))
}
