use handlebars::{no_escape, Handlebars};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

use crate::server::schema::Shape;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt `{name}` failed to compile: {source}")]
    Compile {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },
    #[error("prompt `{name}` references undeclared field `{field}`")]
    UnknownField { name: String, field: String },
    #[error("prompt `{name}` input is not an object")]
    NotAnObject { name: String },
    #[error("prompt `{name}` failed to render: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\{?\s*([^{}\s]+)\s*\}?\}\}").expect("placeholder pattern is valid")
    })
}

/// A compiled prompt over the fields of one input shape.
///
/// Placeholders are plain handlebars expressions (`{{molecule}}` or
/// `{{{molecule}}}`); values are inserted without HTML escaping and list
/// values are joined with `", "`.
pub struct PromptTemplate {
    name: String,
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplate").field("name", &self.name).finish()
    }
}

impl PromptTemplate {
    pub fn compile(name: &str, source: &str, input: &Shape) -> Result<Self, PromptError> {
        for captures in placeholder_pattern().captures_iter(source) {
            let field = &captures[1];
            if !input.field_names().any(|declared| declared == field) {
                return Err(PromptError::UnknownField {
                    name: name.to_string(),
                    field: field.to_string(),
                });
            }
        }

        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(no_escape);
        registry
            .register_template_string(name, source)
            .map_err(|e| PromptError::Compile {
                name: name.to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            name: name.to_string(),
            registry,
        })
    }

    pub fn render(&self, record: &Value) -> Result<String, PromptError> {
        let object = record.as_object().ok_or_else(|| PromptError::NotAnObject {
            name: self.name.clone(),
        })?;

        let context: Map<String, Value> = object
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(flatten(value))))
            .collect();

        self.registry
            .render(&self.name, &context)
            .map_err(|e| PromptError::Render {
                name: self.name.clone(),
                source: Box::new(e),
            })
    }
}

fn flatten(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::schema::FieldSpec;
    use serde_json::json;

    fn shape() -> Shape {
        Shape::new()
            .field(FieldSpec::string("moleculeName"))
            .field(FieldSpec::string_list("dataSources"))
    }

    #[test]
    fn renders_every_placeholder_and_joins_lists() {
        let template = PromptTemplate::compile(
            "signals",
            "Molecule Name: {{{moleculeName}}}\nData Sources: {{dataSources}}",
            &shape(),
        )
        .unwrap();

        let record = json!({
            "moleculeName": "Metformin <b>",
            "dataSources": ["Patient Forums", "Guideline Updates"],
        });
        let first = template.render(&record).unwrap();
        let second = template.render(&record).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first,
            "Molecule Name: Metformin <b>\nData Sources: Patient Forums, Guideline Updates"
        );
        assert!(!first.contains("{{"));
    }

    #[test]
    fn rejects_placeholders_outside_the_shape() {
        let err = PromptTemplate::compile("bad", "Hello {{disease}}", &shape()).unwrap_err();
        assert!(matches!(err, PromptError::UnknownField { ref field, .. } if field == "disease"));
    }

    #[test]
    fn strict_mode_refuses_missing_values() {
        let template = PromptTemplate::compile("signals", "{{moleculeName}}", &shape()).unwrap();
        assert!(template.render(&json!({})).is_err());
        assert!(template.render(&json!("nope")).is_err());
    }
}
