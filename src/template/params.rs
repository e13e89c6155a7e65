//! Template parameter sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Plain text substituted as-is.
    Text(String),
    /// Named sub-fields, addressed as `{{Name.Field}}` (e.g. a mentor persona).
    Structured(BTreeMap<String, String>),
}

/// The fixed parameter set plus the free-form extras custom templates accept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParams {
    #[serde(default)]
    values: BTreeMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    extras: BTreeMap<String, String>,
}

impl TemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a text parameter.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(name.into(), ParamValue::Text(value.into()));
    }

    /// Set a structured parameter from `(field, value)` pairs.
    pub fn set_structured<I, K, V>(&mut self, name: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.values
            .insert(name.into(), ParamValue::Structured(fields));
    }

    /// Add an extra parameter, only visible to templates that accept extras.
    pub fn set_extra(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.extras.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_structured<I, K, V>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.set_structured(name, fields);
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_extra(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn extras(&self) -> &BTreeMap<String, String> {
        &self.extras
    }

    /// Text value of `name`. Fixed parameters shadow extras of the same name.
    pub fn text(&self, name: &str, include_extras: bool) -> Option<&str> {
        match self.values.get(name) {
            Some(ParamValue::Text(value)) => Some(value),
            Some(ParamValue::Structured(_)) => None,
            None if include_extras => self.extras.get(name).map(String::as_str),
            None => None,
        }
    }

    /// Whether `name` has non-blank text.
    pub fn has_text(&self, name: &str, include_extras: bool) -> bool {
        self.text(name, include_extras)
            .is_some_and(|v| !v.trim().is_empty())
    }

    /// One sub-field of a structured parameter.
    pub fn field(&self, name: &str, field: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ParamValue::Structured(fields)) => fields.get(field).map(String::as_str),
            _ => None,
        }
    }

    /// Whether `name` is structured and every listed sub-field is non-blank.
    pub fn has_complete_structure(&self, name: &str, required_fields: &[String]) -> bool {
        match self.values.get(name) {
            Some(ParamValue::Structured(fields)) => required_fields.iter().all(|f| {
                fields
                    .get(f)
                    .is_some_and(|v| !v.trim().is_empty())
            }),
            _ => false,
        }
    }

    /// Resolve a placeholder token (`Name` or `Name.Field`).
    pub fn lookup(&self, token: &str, include_extras: bool) -> Option<&str> {
        match token.split_once('.') {
            Some((name, field)) => self.field(name, field),
            None => self.text(token, include_extras),
        }
    }
}

/// Helper to create a parameter set from text key-value pairs.
pub fn params<I, K, V>(pairs: I) -> TemplateParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut params = TemplateParams::new();
    for (k, v) in pairs {
        params.set(k, v);
    }
    params
}
