//! Recipe attributes: tags and ingredients.
//!
//! Both kinds share one shape (an owned, named label attached to recipes), so
//! the domain models them once and parameterizes queries by [`AttributeKind`].

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Database identifier for tags and ingredients.
pub type AttributeId = i64;

/// Discriminates the two attribute tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    /// Singular noun used in paths and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Ingredient => "ingredient",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for attribute names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeValidationError {
    #[error("name must not be empty")]
    EmptyName,
}

/// Non-empty attribute name. Names need not be unique per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributeName(String);

impl AttributeName {
    /// Validate and construct an [`AttributeName`].
    pub fn new(name: impl Into<String>) -> Result<Self, AttributeValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AttributeValidationError::EmptyName);
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for AttributeName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<AttributeName> for String {
    fn from(value: AttributeName) -> Self {
        value.0
    }
}

impl TryFrom<String> for AttributeName {
    type Error = AttributeValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A stored tag or ingredient, already scoped to its owner by the query that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    #[schema(example = 7)]
    pub id: AttributeId,
    #[schema(example = "vegan")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_names_are_rejected(#[case] raw: &str) {
        assert_eq!(
            AttributeName::new(raw),
            Err(AttributeValidationError::EmptyName)
        );
    }

    #[test]
    fn names_keep_their_original_case() {
        let name = AttributeName::new("Comfort Food").expect("valid name");
        assert_eq!(name.as_ref(), "Comfort Food");
    }

    #[test]
    fn kind_renders_singular_nouns() {
        assert_eq!(AttributeKind::Tag.to_string(), "tag");
        assert_eq!(AttributeKind::Ingredient.to_string(), "ingredient");
    }
}
