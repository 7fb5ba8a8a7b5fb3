//! Declarative request schemas.
//!
//! A [`Schema`] is an ordered, immutable list of [`Field`]s. Each field carries
//! a [`FieldConstraint`] declaring zero or more of the `required` and
//! `nullable` constraints, plus an informal [`FieldKind`] tag.
//!
//! Schemas are `const` data: they can be inspected before any request exists
//! and are shared by all concurrently handled requests without locking.
//!
//! # Example
//!
//! ```
//! use scoring_core::schema::{Field, FieldKind, Schema};
//!
//! const LOGIN: Schema = Schema::new(
//!     "login",
//!     &[
//!         Field::new("login", FieldKind::Char).required(true).nullable(false),
//!         Field::new("comment", FieldKind::Char).nullable(true),
//!     ],
//! );
//!
//! assert_eq!(LOGIN.len(), 2);
//! assert_eq!(LOGIN.field("login").unwrap().constraint().required(), Some(true));
//! assert_eq!(LOGIN.field("comment").unwrap().constraint().required(), None);
//! ```

use serde::Serialize;

/// Informal type tag of a field.
///
/// Tags document the expected shape of a value. They are never used to
/// coerce or type-check data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free-form text.
    Char,
    /// Nested argument object.
    Arguments,
    /// E-mail address.
    Email,
    /// Phone number (string or number).
    Phone,
    /// Calendar date.
    Date,
    /// Birth date.
    BirthDay,
    /// Gender code.
    Gender,
    /// List of client identifiers.
    ClientIds,
}

/// Presence and emptiness constraints of a single field.
///
/// `None` means the constraint is not declared, which is distinct from a
/// declared `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct FieldConstraint {
    required: Option<bool>,
    nullable: Option<bool>,
}

impl FieldConstraint {
    /// A constraint set with nothing declared.
    pub const NONE: Self = Self {
        required: None,
        nullable: None,
    };

    /// Creates a constraint set with both constraints declared.
    #[must_use]
    pub const fn new(required: bool, nullable: bool) -> Self {
        Self {
            required: Some(required),
            nullable: Some(nullable),
        }
    }

    /// Returns the declared `required` constraint.
    #[must_use]
    pub const fn required(&self) -> Option<bool> {
        self.required
    }

    /// Returns the declared `nullable` constraint.
    #[must_use]
    pub const fn nullable(&self) -> Option<bool> {
        self.nullable
    }

    /// Returns a copy with `required` declared.
    #[must_use]
    pub const fn with_required(self, required: bool) -> Self {
        Self {
            required: Some(required),
            nullable: self.nullable,
        }
    }

    /// Returns a copy with `nullable` declared.
    #[must_use]
    pub const fn with_nullable(self, nullable: bool) -> Self {
        Self {
            required: self.required,
            nullable: Some(nullable),
        }
    }
}

/// A named field of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Field {
    name: &'static str,
    kind: FieldKind,
    constraint: FieldConstraint,
}

impl Field {
    /// Creates a field with no constraints declared.
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            constraint: FieldConstraint::NONE,
        }
    }

    /// Declares the `required` constraint.
    #[must_use]
    pub const fn required(self, required: bool) -> Self {
        Self {
            constraint: self.constraint.with_required(required),
            ..self
        }
    }

    /// Declares the `nullable` constraint.
    #[must_use]
    pub const fn nullable(self, nullable: bool) -> Self {
        Self {
            constraint: self.constraint.with_nullable(nullable),
            ..self
        }
    }

    /// Returns the field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type tag.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns the declared constraints.
    #[must_use]
    pub const fn constraint(&self) -> FieldConstraint {
        self.constraint
    }
}

/// An ordered, immutable set of fields describing one request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schema {
    name: &'static str,
    fields: &'static [Field],
}

impl Schema {
    /// Creates a schema from fields in declaration order.
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [Field]) -> Self {
        Self { name, fields }
    }

    /// Returns the schema name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub const fn fields(&self) -> &'static [Field] {
        self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the schema declares no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(Field::name)
    }
}

/// The outer request envelope.
pub const METHOD_REQUEST: Schema = Schema::new(
    "method_request",
    &[
        Field::new("account", FieldKind::Char)
            .required(false)
            .nullable(true),
        Field::new("login", FieldKind::Char)
            .required(true)
            .nullable(true),
        Field::new("token", FieldKind::Char)
            .required(true)
            .nullable(true),
        Field::new("arguments", FieldKind::Arguments)
            .required(true)
            .nullable(true),
        Field::new("method", FieldKind::Char)
            .required(true)
            .nullable(false),
    ],
);

/// Arguments of the `online_score` method.
pub const ONLINE_SCORE_REQUEST: Schema = Schema::new(
    "online_score_request",
    &[
        Field::new("first_name", FieldKind::Char)
            .required(false)
            .nullable(true),
        Field::new("last_name", FieldKind::Char)
            .required(false)
            .nullable(true),
        Field::new("email", FieldKind::Email)
            .required(false)
            .nullable(true),
        Field::new("phone", FieldKind::Phone)
            .required(false)
            .nullable(true),
        Field::new("birthday", FieldKind::BirthDay)
            .required(false)
            .nullable(true),
        Field::new("gender", FieldKind::Gender)
            .required(false)
            .nullable(true),
    ],
);

/// Arguments of the `clients_interests` method.
pub const CLIENTS_INTERESTS_REQUEST: Schema = Schema::new(
    "clients_interests_request",
    &[
        Field::new("client_ids", FieldKind::ClientIds).required(true),
        Field::new("date", FieldKind::Date)
            .required(false)
            .nullable(true),
    ],
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_request_declaration_order() {
        let names: Vec<_> = METHOD_REQUEST.field_names().collect();
        assert_eq!(names, ["account", "login", "token", "arguments", "method"]);
    }

    #[test]
    fn test_method_field_is_not_nullable() {
        let method = METHOD_REQUEST.field("method").unwrap();
        assert_eq!(method.constraint(), FieldConstraint::new(true, false));
        assert_eq!(method.kind(), FieldKind::Char);
    }

    #[test]
    fn test_client_ids_declares_only_required() {
        let client_ids = CLIENTS_INTERESTS_REQUEST.field("client_ids").unwrap();
        assert_eq!(client_ids.constraint().required(), Some(true));
        assert_eq!(client_ids.constraint().nullable(), None);
    }

    #[test]
    fn test_online_score_fields_all_optional() {
        assert_eq!(ONLINE_SCORE_REQUEST.len(), 6);
        for field in ONLINE_SCORE_REQUEST.fields() {
            assert_eq!(field.constraint(), FieldConstraint::new(false, true));
        }
    }

    #[test]
    fn test_unknown_field_lookup() {
        assert!(METHOD_REQUEST.field("password").is_none());
        assert!(!METHOD_REQUEST.is_empty());
    }

    #[test]
    fn test_constraint_builders_keep_other_constraint() {
        let constraint = FieldConstraint::NONE.with_nullable(true).with_required(false);
        assert_eq!(constraint, FieldConstraint::new(false, true));
    }
}
