//! Declared input/output shapes and the validator that checks raw form
//! submissions and model replies against them.

pub mod errors;

pub use errors::{Reason, ValidationError, ValidationErrors};

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use url::Url;

/// Key/value pairs in submission order. Keys may repeat (checkbox groups).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pairs: Vec<(String, String)>,
}

impl RawFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

impl From<Vec<(String, String)>> for RawFields {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    StringList,
    Enum(Vec<&'static str>),
    Url,
    Records(Shape),
}

impl FieldKind {
    fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::Enum(_) | FieldKind::Url => "string",
            FieldKind::StringList | FieldKind::Records(_) => "list",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    description: &'static str,
    required: bool,
    min_len: usize,
    message: Option<&'static str>,
}

impl FieldSpec {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            required: true,
            min_len: 1,
            message: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn string_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringList)
    }

    pub fn one_of(name: &'static str, allowed: &[&'static str]) -> Self {
        Self::new(name, FieldKind::Enum(allowed.to_vec()))
    }

    pub fn url(name: &'static str) -> Self {
        Self::new(name, FieldKind::Url)
    }

    pub fn records(name: &'static str, shape: Shape) -> Self {
        Self::new(name, FieldKind::Records(shape))
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Minimum length in characters; applies to each item of a string list.
    pub fn min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    /// User-facing text for `missing` and `too_short` failures.
    pub fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    fn missing(&self, path: &str) -> ValidationError {
        let message = self
            .message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} is required.", self.name));
        ValidationError::new(path, Reason::Missing, message)
    }

    fn too_short(&self, path: &str) -> ValidationError {
        let message = self.message.map(str::to_string).unwrap_or_else(|| {
            format!("{} must be at least {} characters.", self.name, self.min_len)
        });
        ValidationError::new(path, Reason::TooShort, message)
    }

    fn wrong_type(&self, path: &str, expected: &str) -> ValidationError {
        ValidationError::new(
            path,
            Reason::WrongType,
            format!("{} must be a {}.", self.name, expected),
        )
    }

    /// Checks a present, non-null value. Returns the value to keep, or `None`
    /// when the field is blank and optional.
    fn check(&self, path: &str, value: &Value, errors: &mut ValidationErrors) -> Option<Value> {
        match &self.kind {
            FieldKind::String => {
                let s = self.expect_str(path, value, errors)?;
                if s.trim().is_empty() {
                    if self.required {
                        errors.push(self.missing(path));
                    }
                    return None;
                }
                if s.trim().chars().count() < self.min_len {
                    errors.push(self.too_short(path));
                    return None;
                }
                Some(value.clone())
            }
            FieldKind::Enum(allowed) => {
                let s = self.expect_str(path, value, errors)?;
                if s.trim().is_empty() {
                    if self.required {
                        errors.push(self.missing(path));
                    }
                    return None;
                }
                if !allowed.iter().any(|a| *a == s) {
                    errors.push(ValidationError::new(
                        path,
                        Reason::NotInSet,
                        format!("{} must be one of: {}.", self.name, allowed.join(", ")),
                    ));
                    return None;
                }
                Some(value.clone())
            }
            FieldKind::Url => {
                let s = self.expect_str(path, value, errors)?;
                if s.trim().is_empty() && !self.required {
                    return None;
                }
                if s.trim().is_empty() {
                    errors.push(self.missing(path));
                    return None;
                }
                let web_link = Url::parse(s)
                    .map(|url| matches!(url.scheme(), "http" | "https"))
                    .unwrap_or(false);
                if !web_link {
                    errors.push(ValidationError::new(
                        path,
                        Reason::MalformedUrl,
                        format!("{} must be a valid http(s) URL.", self.name),
                    ));
                    return None;
                }
                Some(value.clone())
            }
            FieldKind::StringList => {
                let Some(items) = value.as_array() else {
                    errors.push(self.wrong_type(path, "list of strings"));
                    return None;
                };
                let before = errors.len();
                let mut kept = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    let Some(s) = item.as_str() else {
                        errors.push(self.wrong_type(&item_path, "list of strings"));
                        continue;
                    };
                    if s.trim().is_empty() {
                        continue;
                    }
                    if s.trim().chars().count() < self.min_len {
                        errors.push(self.too_short(&item_path));
                        continue;
                    }
                    kept.push(item.clone());
                }
                if kept.is_empty() && self.required && errors.len() == before {
                    errors.push(self.missing(path));
                    return None;
                }
                Some(Value::Array(kept))
            }
            FieldKind::Records(shape) => {
                let Some(items) = value.as_array() else {
                    errors.push(self.wrong_type(path, "list"));
                    return None;
                };
                let records = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        Value::Object(shape.check_at(&format!("{path}[{i}]"), item, errors))
                    })
                    .collect();
                Some(Value::Array(records))
            }
        }
    }

    fn expect_str<'v>(
        &self,
        path: &str,
        value: &'v Value,
        errors: &mut ValidationErrors,
    ) -> Option<&'v str> {
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                errors.push(self.wrong_type(path, self.kind.type_name()));
                None
            }
        }
    }

    fn json_schema(&self) -> Value {
        let mut schema = match &self.kind {
            FieldKind::String => {
                let mut s = json!({ "type": "string" });
                if self.min_len > 1 {
                    s["minLength"] = json!(self.min_len);
                }
                s
            }
            FieldKind::StringList => json!({ "type": "array", "items": { "type": "string" } }),
            FieldKind::Enum(allowed) => json!({ "type": "string", "enum": allowed }),
            FieldKind::Url => json!({ "type": "string", "format": "uri" }),
            FieldKind::Records(shape) => json!({ "type": "array", "items": shape.json_schema() }),
        };
        if !self.description.is_empty() {
            schema["description"] = json!(self.description);
        }
        schema
    }
}

/// An ordered set of declared fields.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    fields: Vec<FieldSpec>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Validates a JSON object, returning a copy holding only the declared
    /// fields. Every failure is reported, not just the first.
    pub fn check(&self, value: &Value) -> Result<Value, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let record = self.check_at("", value, &mut errors);
        if errors.is_empty() {
            Ok(Value::Object(record))
        } else {
            Err(errors)
        }
    }

    fn check_at(
        &self,
        prefix: &str,
        value: &Value,
        errors: &mut ValidationErrors,
    ) -> Map<String, Value> {
        let mut record = Map::new();
        let Some(object) = value.as_object() else {
            let path = if prefix.is_empty() { "$" } else { prefix };
            errors.push(ValidationError::new(path, Reason::WrongType, "expected an object"));
            return record;
        };

        for spec in &self.fields {
            let path = if prefix.is_empty() {
                spec.name.to_string()
            } else {
                format!("{prefix}.{}", spec.name)
            };
            match object.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        errors.push(spec.missing(&path));
                    }
                }
                Some(v) => {
                    if let Some(kept) = spec.check(&path, v, errors) {
                        record.insert(spec.name.to_string(), kept);
                    }
                }
            }
        }
        record
    }

    /// Builds the JSON object a form submission stands for: scalar fields take
    /// their first value, list fields take every non-blank value in order.
    /// Values are trimmed of surrounding whitespace.
    pub fn object_from_form(&self, raw: &RawFields) -> Value {
        let mut object = Map::new();
        for spec in &self.fields {
            match spec.kind {
                FieldKind::StringList => {
                    let values: Vec<Value> = raw
                        .all(spec.name)
                        .into_iter()
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(|v| Value::String(v.to_string()))
                        .collect();
                    if !values.is_empty() {
                        object.insert(spec.name.to_string(), Value::Array(values));
                    }
                }
                FieldKind::Records(_) => {}
                _ => {
                    if let Some(v) = raw.first(spec.name) {
                        object.insert(spec.name.to_string(), Value::String(v.trim().to_string()));
                    }
                }
            }
        }
        Value::Object(object)
    }

    /// Validates a form submission into a typed record.
    pub fn parse_form<T: DeserializeOwned>(&self, raw: &RawFields) -> Result<T, ValidationErrors> {
        self.parse_value(&self.object_from_form(raw))
    }

    /// Validates a JSON value into a typed record.
    pub fn parse_value<T: DeserializeOwned>(&self, value: &Value) -> Result<T, ValidationErrors> {
        let record = self.check(value)?;
        serde_json::from_value(record).map_err(|e| {
            let mut errors = ValidationErrors::new();
            errors.push(ValidationError::new("$", Reason::WrongType, e.to_string()));
            errors
        })
    }

    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}
