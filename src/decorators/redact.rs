use serde_json::Value;
use tracing::debug;

use super::Operation;
use crate::constants::redaction::SENSITIVE_FIELDS;
use crate::errors::AnalyticsError;
use crate::hash::redaction_digest;
use crate::types::FieldMap;

/// Argument types a [`Redactor`] knows how to inspect.
///
/// Only a top-level field mapping is rewritten. Scalars and later tuple
/// members pass through untouched, and nested mappings are not searched.
pub trait Redact: Sized {
    /// Replace every listed field present at the top level with its digest.
    fn redact(self, fields: &[&str]) -> Self;
}

fn digest_value(value: &Value) -> Value {
    let plain = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    Value::String(redaction_digest(&plain))
}

impl Redact for FieldMap {
    fn redact(mut self, fields: &[&str]) -> Self {
        for field in fields {
            if let Some(value) = self.get_mut(*field) {
                *value = digest_value(value);
            }
        }
        self
    }
}

impl Redact for Value {
    fn redact(mut self, fields: &[&str]) -> Self {
        if let Value::Object(map) = &mut self {
            for field in fields {
                if let Some(value) = map.get_mut(*field) {
                    *value = digest_value(value);
                }
            }
        }
        self
    }
}

impl<B> Redact for (FieldMap, B) {
    fn redact(self, fields: &[&str]) -> Self {
        (self.0.redact(fields), self.1)
    }
}

macro_rules! passthrough_redact {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Redact for $ty {
                fn redact(self, _fields: &[&str]) -> Self {
                    self
                }
            }
        )*
    };
}

passthrough_redact!(
    (),
    String,
    &str,
    u8,
    u16,
    u32,
    u64,
    usize,
    i32,
    i64,
    bool
);

/// Digests sensitive fields of a field-mapping argument before the wrapped
/// operation sees it. Non-sensitive fields are forwarded unchanged.
pub struct Redactor<O> {
    inner: O,
    fields: Vec<&'static str>,
}

impl<O> Redactor<O> {
    /// Redact the default sensitive fields (`national_id`, `passport_number`, `phone`).
    pub fn new(inner: O) -> Self {
        Self::with_fields(inner, SENSITIVE_FIELDS.to_vec())
    }

    /// Redact exactly `fields` instead of the defaults.
    pub fn with_fields(inner: O, fields: Vec<&'static str>) -> Self {
        Self { inner, fields }
    }

    /// Names of the fields that get digested.
    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    /// Borrow the wrapped operation.
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<A, O> Operation<A> for Redactor<O>
where
    A: Redact,
    O: Operation<A>,
{
    type Output = O::Output;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&self, args: A) -> Result<Self::Output, AnalyticsError> {
        debug!(operation = self.inner.name(), "privacy check");
        self.inner.call(args.redact(&self.fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorators::FnOperation;
    use crate::hash::redaction_digest;

    fn sensitive_fields() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("national_id".into(), Value::from("1234567890"));
        fields.insert("passport_number".into(), Value::from("P12345678"));
        fields.insert("phone".into(), Value::from("+966501234567"));
        fields.insert("name".into(), Value::from("Test User"));
        fields
    }

    fn echo() -> Redactor<FnOperation<fn(FieldMap) -> Result<FieldMap, AnalyticsError>>> {
        Redactor::new(FnOperation::new(
            "echo",
            Ok as fn(FieldMap) -> Result<FieldMap, AnalyticsError>,
        ))
    }

    #[test]
    fn sensitive_fields_are_digested_and_others_pass_through() {
        let result = echo().call(sensitive_fields()).unwrap();
        assert_ne!(result["national_id"], Value::from("1234567890"));
        assert_ne!(result["passport_number"], Value::from("P12345678"));
        assert_ne!(result["phone"], Value::from("+966501234567"));
        assert_eq!(result["name"], Value::from("Test User"));
        assert_eq!(
            result["national_id"],
            Value::from(redaction_digest("1234567890"))
        );
    }

    #[test]
    fn redaction_is_deterministic_across_calls() {
        let redactor = echo();
        let first = redactor.call(sensitive_fields()).unwrap();
        let second = redactor.call(sensitive_fields()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_string_values_are_digested_from_their_text_form() {
        let mut fields = FieldMap::new();
        fields.insert("national_id".into(), Value::from(1234567890u64));
        let result = echo().call(fields).unwrap();
        assert_eq!(
            result["national_id"],
            Value::from(redaction_digest("1234567890"))
        );
    }

    #[test]
    fn non_mapping_inputs_are_forwarded_unmodified() {
        let op = Redactor::new(FnOperation::new("len", |text: String| Ok(text.len())));
        assert_eq!(op.call("1234567890".to_string()).unwrap(), 10);

        let op = Redactor::new(FnOperation::new("json", |value: Value| Ok(value)));
        let array = serde_json::json!(["1234567890"]);
        assert_eq!(op.call(array.clone()).unwrap(), array);
    }

    #[test]
    fn json_objects_are_redacted_but_nested_values_are_not() {
        let op = Redactor::new(FnOperation::new("json", |value: Value| Ok(value)));
        let input = serde_json::json!({
            "phone": "+966501234567",
            "contact": {"phone": "+966501234567"}
        });
        let output = op.call(input).unwrap();
        assert_eq!(output["phone"], Value::from(redaction_digest("+966501234567")));
        assert_eq!(output["contact"]["phone"], Value::from("+966501234567"));
    }

    #[test]
    fn only_first_tuple_member_is_redacted() {
        let op = Redactor::new(FnOperation::new(
            "pair",
            |(fields, extra): (FieldMap, String)| Ok((fields, extra)),
        ));
        let (fields, extra) = op
            .call((sensitive_fields(), "1234567890".to_string()))
            .unwrap();
        assert_ne!(fields["national_id"], Value::from("1234567890"));
        assert_eq!(extra, "1234567890");
    }

    #[test]
    fn custom_field_lists_are_respected() {
        let op = Redactor::with_fields(
            FnOperation::new("echo", |fields: FieldMap| Ok(fields)),
            vec!["name"],
        );
        assert_eq!(op.fields(), &["name"]);
        let result = op.call(sensitive_fields()).unwrap();
        assert_eq!(result["national_id"], Value::from("1234567890"));
        assert_ne!(result["name"], Value::from("Test User"));
    }
}
