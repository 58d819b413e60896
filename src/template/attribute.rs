//! Attribute templates.

use super::Validator;
use crate::error::{Result, ValidationError};
use crate::tree::{Attribute, Node, Value, ValueType};

/// Shared settings of attribute templates.
#[derive(Debug, Clone, Default)]
pub struct AttributeSpec {
    /// Whether the attribute may be absent
    pub optional: bool,
    /// Declared value type
    pub value_type: ValueType,
    /// Validator callback
    pub validator: Option<Validator<Value>>,
    /// Value used when the attribute is absent
    pub default: Value,
    /// Description used in sample configurations
    pub description: Option<String>,
}

impl AttributeSpec {
    /// Validates `attr` in place.
    ///
    /// Returns `None` when the value ends up null, meaning the attribute
    /// should be omitted from the tree.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::TypeMismatch`] when a non-empty value cannot be
    ///   converted to the declared type.
    /// - [`ValidationError::AttributeFailed`] when the validator rejects
    ///   the value.
    /// - [`ValidationError::MissingMandatory`] for a mandatory attribute
    ///   with neither a value nor a default.
    pub fn check(&self, mut attr: Attribute) -> Result<Option<Attribute>> {
        if !attr.value().is_null() && !self.value_type.matches(attr.value()) {
            match self.value_type.coerce(attr.value()) {
                Some(coerced) => attr.set_value(coerced),
                None if attr.value().is_empty() => {}
                None => {
                    return Err(ValidationError::TypeMismatch {
                        path: attr.path(),
                        expected: self.value_type,
                    }
                    .into());
                }
            }
        }

        if let Some(validator) = &self.validator
            && (!self.optional || !attr.value().is_null())
            && let Err(detail) = validator.check(attr.value())
        {
            return Err(ValidationError::AttributeFailed {
                path: attr.path(),
                value: attr.value().to_string(),
                detail,
            }
            .into());
        }

        if attr.value().is_null() {
            if !self.optional {
                return Err(ValidationError::MissingMandatory { path: attr.path() }.into());
            }
            return Ok(None);
        }
        Ok(Some(attr))
    }
}

// ============================================================================
// Fixed-name attribute
// ============================================================================

/// Template for an attribute with a known name.
///
/// Optional, typed `str` and without a default unless configured.
#[derive(Debug, Clone)]
pub struct FixedAttribute {
    name: String,
    spec: AttributeSpec,
}

impl FixedAttribute {
    /// Creates an optional string attribute template.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: AttributeSpec {
                optional: true,
                ..AttributeSpec::default()
            },
        }
    }

    /// Marks the attribute as mandatory.
    #[must_use]
    pub const fn mandatory(mut self) -> Self {
        self.spec.optional = false;
        self
    }

    /// Sets whether the attribute may be absent.
    #[must_use]
    pub const fn optional(mut self, optional: bool) -> Self {
        self.spec.optional = optional;
        self
    }

    /// Sets the declared value type.
    #[must_use]
    pub const fn value_type(mut self, value_type: ValueType) -> Self {
        self.spec.value_type = value_type;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.spec.default = value.into();
        self
    }

    /// Sets the description used in samples.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = Some(description.into());
        self
    }

    /// Accepts values for which `f` returns `true`.
    #[must_use]
    pub fn validator(mut self, f: impl Fn(&Value) -> bool + 'static) -> Self {
        self.spec.validator = Some(Validator::predicate(f));
        self
    }

    /// Accepts values for which `f` returns `Ok(true)`; `Err` text is
    /// reported with the failure.
    #[must_use]
    pub fn try_validator(
        mut self,
        f: impl Fn(&Value) -> std::result::Result<bool, String> + 'static,
    ) -> Self {
        self.spec.validator = Some(Validator::new(f));
        self
    }

    /// Installs an existing validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator<Value>) -> Self {
        self.spec.validator = Some(validator);
        self
    }

    /// Attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared settings.
    #[must_use]
    pub const fn spec(&self) -> &AttributeSpec {
        &self.spec
    }

    /// Validates an attribute, substituting the default when it is absent.
    ///
    /// # Errors
    ///
    /// See [`AttributeSpec::check`].
    pub fn validate(&self, actual: Option<Attribute>) -> Result<Option<Attribute>> {
        self.validate_in(actual, None)
    }

    /// Like [`validate`](Self::validate); a substituted default is linked
    /// to `parent` so error messages carry its full path.
    pub(crate) fn validate_in(
        &self,
        actual: Option<Attribute>,
        parent: Option<&Node>,
    ) -> Result<Option<Attribute>> {
        let attr = actual.unwrap_or_else(|| {
            let mut attr = Attribute::new(self.name.clone(), self.spec.default.clone());
            if let Some(parent) = parent {
                attr.set_parent(parent.downgrade());
            }
            attr
        });
        self.spec.check(attr)
    }
}

// ============================================================================
// Variable-name attribute
// ============================================================================

/// Template applied to every attribute of a [`VariableNode`].
///
/// Always optional and without a default.
#[derive(Debug, Clone)]
pub struct VariableAttribute {
    spec: AttributeSpec,
}

impl Default for VariableAttribute {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableAttribute {
    /// Creates a string-typed template.
    #[must_use]
    pub fn new() -> Self {
        Self {
            spec: AttributeSpec {
                optional: true,
                ..AttributeSpec::default()
            },
        }
    }

    /// Sets the declared value type.
    #[must_use]
    pub const fn value_type(mut self, value_type: ValueType) -> Self {
        self.spec.value_type = value_type;
        self
    }

    /// Sets the description used in samples.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = Some(description.into());
        self
    }

    /// Accepts values for which `f` returns `true`.
    #[must_use]
    pub fn validator(mut self, f: impl Fn(&Value) -> bool + 'static) -> Self {
        self.spec.validator = Some(Validator::predicate(f));
        self
    }

    /// Accepts values for which `f` returns `Ok(true)`.
    #[must_use]
    pub fn try_validator(
        mut self,
        f: impl Fn(&Value) -> std::result::Result<bool, String> + 'static,
    ) -> Self {
        self.spec.validator = Some(Validator::new(f));
        self
    }

    /// Installs an existing validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator<Value>) -> Self {
        self.spec.validator = Some(validator);
        self
    }

    /// Shared settings.
    #[must_use]
    pub const fn spec(&self) -> &AttributeSpec {
        &self.spec
    }

    /// Validates one attribute of a variable node.
    ///
    /// # Errors
    ///
    /// See [`AttributeSpec::check`].
    pub fn validate(&self, attr: Attribute) -> Result<Option<Attribute>> {
        self.spec.check(attr)
    }
}
