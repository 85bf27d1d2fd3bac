use std::collections::HashMap;
use std::sync::OnceLock;

use datasmith_core::{Property, Value, ValueKind};

use crate::errors::GenerationError;

fn empty_row() -> &'static HashMap<String, Value> {
    static EMPTY: OnceLock<HashMap<String, Value>> = OnceLock::new();
    EMPTY.get_or_init(HashMap::new)
}

fn empty_kinds() -> &'static HashMap<String, ValueKind> {
    static EMPTY: OnceLock<HashMap<String, ValueKind>> = OnceLock::new();
    EMPTY.get_or_init(HashMap::new)
}

/// Per-(row, property) view handed to providers.
///
/// Access is restricted to the current property's declared arguments: a
/// provider cannot read a sibling property's value unless that sibling is
/// bound under one of its argument names. Anything a provider reads is
/// therefore represented as an edge in the dependency graph.
#[derive(Debug)]
pub struct GenerationContext<'a> {
    row_index: usize,
    row_count: usize,
    property: &'a Property,
    row: &'a HashMap<String, Value>,
    kinds: &'a HashMap<String, ValueKind>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        row_index: usize,
        row_count: usize,
        property: &'a Property,
        row: &'a HashMap<String, Value>,
        kinds: &'a HashMap<String, ValueKind>,
    ) -> Self {
        Self {
            row_index,
            row_count,
            property,
            row,
            kinds,
        }
    }

    /// Throwaway single-row context at row index 0, for providers that
    /// perform nested lookups through their own value sources.
    pub fn detached(property: &'a Property) -> Self {
        Self {
            row_index: 0,
            row_count: 1,
            property,
            row: empty_row(),
            kinds: empty_kinds(),
        }
    }

    pub fn row_index(&self) -> usize {
        self.row_index
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn property(&self) -> &Property {
        self.property
    }

    /// True iff the current property declared an argument under `name`.
    pub fn has_argument(&self, name: &str) -> bool {
        self.property.arguments.contains_key(name)
    }

    /// Value of the first property bound under `name` in the current row.
    ///
    /// Fails when the name was never declared, binds nothing, or resolves
    /// to a null value.
    pub fn argument_value(&self, name: &str) -> Result<Value, GenerationError> {
        let bindings = self.bindings(name)?;
        let first = bindings.first().ok_or_else(|| self.access_error(name))?;
        let value = self.row_property(first)?;
        if value.is_null() {
            return Err(GenerationError::NullArgument {
                property: self.property.id.clone(),
                name: name.to_string(),
            });
        }
        Ok(value)
    }

    /// Values of every property bound under `name`, in binding order.
    pub fn argument_values(&self, name: &str) -> Result<Vec<Value>, GenerationError> {
        let bindings = self.bindings(name)?;
        bindings
            .iter()
            .map(|id| self.row_property(id))
            .collect()
    }

    /// Low-level accessor for an already-generated sibling value.
    ///
    /// `id` must appear in some argument binding of the current property.
    /// Rows missing an entry resolve to the declared kind's default.
    pub fn row_property(&self, id: &str) -> Result<Value, GenerationError> {
        if !self.property.declares_dependency_on(id) {
            return Err(self.access_error(id));
        }
        if let Some(value) = self.row.get(id) {
            return Ok(value.clone());
        }
        let kind = self
            .kinds
            .get(id)
            .copied()
            .unwrap_or(self.property.kind);
        Ok(Value::default_for(kind))
    }

    /// Text argument with a declared-kind check on the bound property.
    pub fn argument_str(&self, name: &str) -> Result<String, GenerationError> {
        let value = self.argument_kind_checked(name, ValueKind::Text)?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Integer argument with a declared-kind check on the bound property.
    pub fn argument_i64(&self, name: &str) -> Result<i64, GenerationError> {
        let value = self.argument_kind_checked(name, ValueKind::Int)?;
        Ok(value.as_i64().unwrap_or_default())
    }

    fn argument_kind_checked(
        &self,
        name: &str,
        expected: ValueKind,
    ) -> Result<Value, GenerationError> {
        let bindings = self.bindings(name)?;
        let first = bindings.first().ok_or_else(|| self.access_error(name))?;
        if let Some(actual) = self.kinds.get(first)
            && *actual != expected
        {
            return Err(GenerationError::TypeMismatch {
                property: self.property.id.clone(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        self.argument_value(name)
    }

    fn bindings(&self, name: &str) -> Result<&[String], GenerationError> {
        self.property
            .arguments
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| self.access_error(name))
    }

    fn access_error(&self, name: &str) -> GenerationError {
        GenerationError::AccessViolation {
            property: self.property.id.clone(),
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasmith_core::Property;

    fn kinds() -> HashMap<String, ValueKind> {
        HashMap::from([
            ("country".to_string(), ValueKind::Text),
            ("age".to_string(), ValueKind::Int),
        ])
    }

    #[test]
    fn undeclared_argument_is_an_access_violation() {
        let property = Property::new("city", ValueKind::Text);
        let row = HashMap::from([("country".to_string(), Value::Text("Brazil".into()))]);
        let kinds = kinds();
        let ctx = GenerationContext::new(0, 10, &property, &row, &kinds);

        assert!(!ctx.has_argument("country"));
        assert!(matches!(
            ctx.argument_value("country"),
            Err(GenerationError::AccessViolation { .. })
        ));
        assert!(matches!(
            ctx.row_property("country"),
            Err(GenerationError::AccessViolation { .. })
        ));
    }

    #[test]
    fn declared_argument_resolves_current_row_value() {
        let property = Property::new("city", ValueKind::Text).with_argument("country", ["country"]);
        let row = HashMap::from([("country".to_string(), Value::Text("Brazil".into()))]);
        let kinds = kinds();
        let ctx = GenerationContext::new(3, 10, &property, &row, &kinds);

        assert_eq!(ctx.row_index(), 3);
        assert_eq!(ctx.argument_str("country").unwrap(), "Brazil");
    }

    #[test]
    fn missing_row_entry_resolves_to_kind_default() {
        let property = Property::new("city", ValueKind::Text).with_argument("country", ["country"]);
        let row = HashMap::new();
        let kinds = kinds();
        let ctx = GenerationContext::new(0, 10, &property, &row, &kinds);

        assert_eq!(ctx.row_property("country").unwrap(), Value::Text(String::new()));
    }

    #[test]
    fn null_argument_value_is_rejected() {
        let property = Property::new("city", ValueKind::Text).with_argument("country", ["country"]);
        let row = HashMap::from([("country".to_string(), Value::Null)]);
        let kinds = kinds();
        let ctx = GenerationContext::new(0, 10, &property, &row, &kinds);

        assert!(matches!(
            ctx.argument_value("country"),
            Err(GenerationError::NullArgument { .. })
        ));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let property = Property::new("city", ValueKind::Text).with_argument("country", ["age"]);
        let row = HashMap::from([("age".to_string(), Value::Int(7))]);
        let kinds = kinds();
        let ctx = GenerationContext::new(0, 10, &property, &row, &kinds);

        assert!(matches!(
            ctx.argument_str("country"),
            Err(GenerationError::TypeMismatch { .. })
        ));
        assert_eq!(ctx.argument_i64("country").unwrap(), 7);
    }

    #[test]
    fn multi_binding_preserves_order() {
        let property =
            Property::new("email", ValueKind::Text).with_argument("name", ["first", "last"]);
        let row = HashMap::from([
            ("first".to_string(), Value::Text("Ana".into())),
            ("last".to_string(), Value::Text("Silva".into())),
        ]);
        let kinds = HashMap::from([
            ("first".to_string(), ValueKind::Text),
            ("last".to_string(), ValueKind::Text),
        ]);
        let ctx = GenerationContext::new(0, 1, &property, &row, &kinds);

        let values = ctx.argument_values("name").unwrap();
        assert_eq!(
            values,
            vec![Value::Text("Ana".into()), Value::Text("Silva".into())]
        );
    }
}
