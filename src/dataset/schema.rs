//! Typed attribute schema shared by a dataset and all of its slices.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// Index of a class value in the schema's class attribute.
pub type Label = usize;

/// Kind of an attribute column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Numeric,
    /// Legal values, in declaration order. Rows store the value's index.
    Categorical(Vec<String>),
}

/// A named attribute descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
        }
    }

    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Categorical(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, AttributeKind::Numeric)
    }

    /// Legal values of a categorical attribute (empty for numeric ones).
    pub fn values(&self) -> &[String] {
        match &self.kind {
            AttributeKind::Numeric => &[],
            AttributeKind::Categorical(values) => values,
        }
    }

    pub fn num_values(&self) -> usize {
        self.values().len()
    }

    pub fn index_of_value(&self, value: &str) -> Option<usize> {
        self.values().iter().position(|v| v == value)
    }
}

/// Schema of a dataset: ordered regular attributes plus one categorical class attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    relation: String,
    attributes: Vec<Attribute>,
    class: Attribute,
}

impl Schema {
    /// Create a schema. The class attribute must be categorical with at least one value,
    /// and attribute names must be unique.
    pub fn new(
        relation: impl Into<String>,
        attributes: Vec<Attribute>,
        class: Attribute,
    ) -> Result<Self> {
        if class.is_numeric() {
            return Err(EvalError::Schema(format!(
                "class attribute '{}' must be categorical",
                class.name
            )));
        }
        if class.num_values() == 0 {
            return Err(EvalError::Schema(format!(
                "class attribute '{}' has no values",
                class.name
            )));
        }

        for (i, attr) in attributes.iter().enumerate() {
            let clash =
                attributes[..i].iter().any(|a| a.name == attr.name) || attr.name == class.name;
            if clash {
                return Err(EvalError::Schema(format!(
                    "duplicate attribute name '{}'",
                    attr.name
                )));
            }
        }

        Ok(Self {
            relation: relation.into(),
            attributes,
            class,
        })
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Regular (non-class) attributes, in column order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    /// Column index of a regular attribute.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn class_attribute(&self) -> &Attribute {
        &self.class
    }

    pub fn class_values(&self) -> &[String] {
        self.class.values()
    }

    pub fn num_classes(&self) -> usize {
        self.class.num_values()
    }

    pub fn label_name(&self, label: Label) -> Option<&str> {
        self.class.values().get(label).map(String::as_str)
    }

    pub fn label_of(&self, name: &str) -> Option<Label> {
        self.class.index_of_value(name)
    }

    /// Check that a row fits this schema.
    pub fn validate(&self, values: &[f64], label: Label) -> Result<()> {
        if values.len() != self.attributes.len() {
            return Err(EvalError::Schema(format!(
                "expected {} values, got {}",
                self.attributes.len(),
                values.len()
            )));
        }
        if label >= self.num_classes() {
            return Err(EvalError::Schema(format!(
                "label index {label} out of range for '{}' ({} values)",
                self.class.name,
                self.num_classes()
            )));
        }

        for (attr, &value) in self.attributes.iter().zip(values) {
            if let AttributeKind::Categorical(legal) = &attr.kind {
                let valid = value >= 0.0 && value.fract() == 0.0 && (value as usize) < legal.len();
                if !valid {
                    return Err(EvalError::Schema(format!(
                        "value {value} is not a legal index for categorical attribute '{}'",
                        attr.name
                    )));
                }
            }
        }

        Ok(())
    }
}
