//! Declarative DTO validation.
//!
//! A DTO declares the shape of its payload through [`Dto::FIELDS`] (which
//! fields exist, whether they are required, their kind) and its value
//! constraints through `validator::Validate`. [`validate_payload`] checks a
//! raw payload against both and reports every failure in one pass per
//! phase: first all shape failures, then, once the shape is sound, all
//! value-constraint failures.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Where a raw payload was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    Json,
    FormData,
    Query,
}

impl PayloadSource {
    /// Form and query payloads arrive as strings and are coerced to the declared kind.
    fn coerces_strings(self) -> bool {
        !matches!(self, PayloadSource::Json)
    }
}

/// Declared kind of a DTO field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    String,
    /// Any integer that fits in an `i64`.
    Integer,
    /// An integer that fits in an `i32`.
    Int32,
    Number,
    Boolean,
    /// RFC 3339 date-time string.
    Timestamp,
    Enum(&'static [&'static str]),
    Object(&'static [FieldRule]),
    Array,
}

/// Shape rule for one DTO field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// A validated input shape.
///
/// `FIELDS` uses wire names (as they appear in the payload). Keys not listed
/// there are dropped before the DTO is built.
pub trait Dto: DeserializeOwned + Validate + Send + 'static {
    const FIELDS: &'static [FieldRule];
}

/// One rejected property, in the `{property, constraints, value}` wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub property: String,
    /// Rule code (e.g. `isDefined`, `length`) mapped to a readable message.
    pub constraints: BTreeMap<String, String>,
    pub value: Value,
}

/// User input rejected by DTO validation. Always carries at least one failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Validation failed for {} propert(ies)", .failures.len())]
pub struct ValidationError {
    pub failures: Vec<ValidationFailure>,
}

impl ValidationError {
    pub fn single(property: &str, code: &str, message: String, value: Value) -> Self {
        Self {
            failures: vec![failure(property, code, message, value)],
        }
    }

    /// Rejected property paths, in report order.
    pub fn properties(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.property.as_str()).collect()
    }
}

/// A DTO binding that cannot work regardless of input. Never user-facing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{dto} was extracted outside an entity router: request context missing")]
    MissingContext { dto: &'static str },

    #[error("{dto} field rules accepted a payload its type rejects: {detail}")]
    SchemaMismatch { dto: &'static str, detail: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DtoError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Misconfigured(#[from] ConfigurationError),
}

/// Keeps an explicit `null` apart from an absent key on update DTOs:
/// absent is `None`, `null` is `Some(None)`.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Project `raw` onto `D`'s declared fields, check every rule, and build `D`.
pub fn validate_payload<D: Dto>(raw: Value, source: PayloadSource) -> Result<D, DtoError> {
    let Value::Object(raw) = raw else {
        return Err(ValidationError::single(
            "body",
            "isObject",
            "body must be an object".to_string(),
            raw,
        )
        .into());
    };

    let mut failures = Vec::new();
    let projected = Value::Object(check_fields(D::FIELDS, &raw, source, "", &mut failures));
    if !failures.is_empty() {
        return Err(ValidationError { failures }.into());
    }

    let dto: D = serde_json::from_value(projected.clone()).map_err(|e| {
        ConfigurationError::SchemaMismatch {
            dto: std::any::type_name::<D>(),
            detail: e.to_string(),
        }
    })?;

    if let Err(errors) = dto.validate() {
        let mut failures = Vec::new();
        flatten_errors(&errors, D::FIELDS, "", &projected, &mut failures);
        failures.sort_by_key(|f| (declared_position(D::FIELDS, &f.property), f.property.clone()));
        return Err(ValidationError { failures }.into());
    }

    Ok(dto)
}

fn check_fields(
    rules: &[FieldRule],
    raw: &Map<String, Value>,
    source: PayloadSource,
    prefix: &str,
    failures: &mut Vec<ValidationFailure>,
) -> Map<String, Value> {
    let mut projected = Map::new();

    for rule in rules {
        let property = join_path(prefix, rule.name);
        let value = raw
            .get(rule.name)
            .filter(|v| !(source.coerces_strings() && v.as_str() == Some("")));

        match value {
            None | Some(Value::Null) => {
                if rule.required {
                    failures.push(failure(
                        &property,
                        "isDefined",
                        format!("{property} should not be null or undefined"),
                        value.cloned().unwrap_or(Value::Null),
                    ));
                } else if value.is_some() {
                    projected.insert(rule.name.to_string(), Value::Null);
                }
            }
            Some(value) => {
                let value = if source.coerces_strings() {
                    coerce(rule.kind, value)
                } else {
                    value.clone()
                };
                if let Some(checked) = check_kind(rule.kind, value, source, &property, failures) {
                    projected.insert(rule.name.to_string(), checked);
                }
            }
        }
    }

    projected
}

fn check_kind(
    kind: FieldKind,
    value: Value,
    source: PayloadSource,
    property: &str,
    failures: &mut Vec<ValidationFailure>,
) -> Option<Value> {
    let rejected = |code: &str,
                    message: String,
                    failures: &mut Vec<ValidationFailure>,
                    value: Value|
     -> Option<Value> {
        failures.push(failure(property, code, message, value));
        None
    };

    match kind {
        FieldKind::String if value.is_string() => Some(value),
        FieldKind::String => rejected("isString", format!("{property} must be a string"), failures, value),
        FieldKind::Integer if value.is_i64() => Some(value),
        FieldKind::Int32 if value.as_i64().is_some_and(|n| i32::try_from(n).is_ok()) => {
            Some(value)
        }
        FieldKind::Integer | FieldKind::Int32 if value.is_u64() || value.is_i64() => rejected(
            "isInt",
            format!("{property} is out of range for its integer type"),
            failures,
            value,
        ),
        FieldKind::Integer | FieldKind::Int32 => {
            rejected("isInt", format!("{property} must be an integer number"), failures, value)
        }
        FieldKind::Number if value.is_number() => Some(value),
        FieldKind::Number => rejected(
            "isNumber",
            format!("{property} must be a number conforming to the specified constraints"),
            failures,
            value,
        ),
        FieldKind::Boolean if value.is_boolean() => Some(value),
        FieldKind::Boolean => {
            rejected("isBoolean", format!("{property} must be a boolean value"), failures, value)
        }
        FieldKind::Timestamp
            if value
                .as_str()
                .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()) =>
        {
            Some(value)
        }
        FieldKind::Timestamp => rejected(
            "isDateString",
            format!("{property} must be a valid ISO 8601 date string"),
            failures,
            value,
        ),
        FieldKind::Enum(allowed) if value.as_str().is_some_and(|s| allowed.contains(&s)) => {
            Some(value)
        }
        FieldKind::Enum(allowed) => rejected(
            "isEnum",
            format!(
                "{property} must be one of the following values: {}",
                allowed.join(", ")
            ),
            failures,
            value,
        ),
        FieldKind::Object(rules) => match value {
            Value::Object(map) => Some(Value::Object(check_fields(
                rules, &map, source, property, failures,
            ))),
            other => rejected("isObject", format!("{property} must be an object"), failures, other),
        },
        FieldKind::Array if value.is_array() => Some(value),
        FieldKind::Array => rejected("isArray", format!("{property} must be an array"), failures, value),
    }
}

/// Best-effort string coercion for form and query payloads.
///
/// Values that do not parse are returned unchanged so the kind check reports them.
fn coerce(kind: FieldKind, value: &Value) -> Value {
    let Some(s) = value.as_str() else {
        return value.clone();
    };
    let s = s.trim();

    match kind {
        FieldKind::Integer | FieldKind::Int32 => s.parse::<i64>().map(Value::from).ok(),
        FieldKind::Number => s
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        FieldKind::Boolean => match s {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        FieldKind::Array => Some(Value::Array(
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Value::String(part.to_string()))
                .collect(),
        )),
        _ => None,
    }
    .unwrap_or_else(|| value.clone())
}

fn flatten_errors(
    errors: &ValidationErrors,
    rules: &[FieldRule],
    prefix: &str,
    payload: &Value,
    out: &mut Vec<ValidationFailure>,
) {
    for (field, kind) in errors.errors() {
        let name = wire_name(field, rules);
        let property = join_path(prefix, &name);
        let value = payload.get(&name).unwrap_or(&Value::Null);

        match kind {
            ValidationErrorsKind::Field(errs) => {
                let constraints = errs
                    .iter()
                    .map(|e| (e.code.to_string(), constraint_message(e, &property)))
                    .collect();
                out.push(ValidationFailure {
                    property,
                    constraints,
                    value: value.clone(),
                });
            }
            ValidationErrorsKind::Struct(inner) => {
                flatten_errors(inner, nested_rules(&name, rules), &property, value, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let element = value.get(*index).unwrap_or(&Value::Null);
                    let path = format!("{property}.{index}");
                    flatten_errors(inner, &[], &path, element, out);
                }
            }
        }
    }
}

fn constraint_message(error: &validator::ValidationError, property: &str) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    let param = |key: &str| error.params.get(key).map(Value::to_string);

    match error.code.as_ref() {
        "length" => match (param("min"), param("max"), param("equal")) {
            (_, _, Some(equal)) => format!("{property} must be exactly {equal} characters"),
            (Some(min), Some(max), _) => {
                format!("{property} must be between {min} and {max} characters")
            }
            (Some(min), None, _) => format!("{property} must be at least {min} characters"),
            (None, Some(max), _) => format!("{property} must be at most {max} characters"),
            _ => format!("{property} has an invalid length"),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("{property} must be between {min} and {max}"),
            (Some(min), None) => format!("{property} must not be less than {min}"),
            (None, Some(max)) => format!("{property} must not be greater than {max}"),
            _ => format!("{property} is out of range"),
        },
        "email" => format!("{property} must be an email"),
        "url" => format!("{property} must be a URL address"),
        code => format!("{property} failed the {code} constraint"),
    }
}

/// `validator` reports Rust field names; map them back to declared wire names.
fn wire_name(field: &str, rules: &[FieldRule]) -> String {
    if rules.iter().any(|r| r.name == field) {
        return field.to_string();
    }
    let camel = snake_to_camel(field);
    if rules.iter().any(|r| r.name == camel) {
        camel
    } else {
        field.to_string()
    }
}

fn snake_to_camel(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn nested_rules<'a>(name: &str, rules: &'a [FieldRule]) -> &'a [FieldRule] {
    rules
        .iter()
        .find(|r| r.name == name)
        .and_then(|r| match r.kind {
            FieldKind::Object(inner) => Some(inner),
            _ => None,
        })
        .unwrap_or(&[])
}

fn declared_position(rules: &[FieldRule], property: &str) -> usize {
    let head = property.split('.').next().unwrap_or(property);
    rules
        .iter()
        .position(|r| r.name == head)
        .unwrap_or(rules.len())
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn failure(property: &str, code: &str, message: String, value: Value) -> ValidationFailure {
    ValidationFailure {
        property: property.to_string(),
        constraints: BTreeMap::from([(code.to_string(), message)]),
        value,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    const ROLES: &[&str] = &["admin", "editor", "viewer"];

    const ADDRESS_FIELDS: &[FieldRule] = &[
        FieldRule::required("city", FieldKind::String),
        FieldRule::optional("postcode", FieldKind::String),
    ];

    #[derive(Debug, Deserialize, Validate)]
    #[serde(deny_unknown_fields)]
    struct Address {
        #[validate(length(min = 1))]
        city: String,
        postcode: Option<String>,
    }

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase", deny_unknown_fields)]
    struct Signup {
        #[validate(email)]
        email: String,
        #[validate(length(min = 8))]
        password: String,
        full_name: Option<String>,
        role: String,
        #[validate(range(min = 0, max = 130))]
        age: Option<i64>,
        #[validate(nested)]
        address: Option<Address>,
    }

    impl Dto for Signup {
        const FIELDS: &'static [FieldRule] = &[
            FieldRule::required("email", FieldKind::String),
            FieldRule::required("password", FieldKind::String),
            FieldRule::optional("fullName", FieldKind::String),
            FieldRule::required("role", FieldKind::Enum(ROLES)),
            FieldRule::optional("age", FieldKind::Integer),
            FieldRule::optional("address", FieldKind::Object(ADDRESS_FIELDS)),
        ];
    }

    fn valid_signup() -> Value {
        json!({
            "email": "ada@example.com",
            "password": "correct-horse",
            "fullName": "Ada Lovelace",
            "role": "editor",
        })
    }

    fn invalid(result: Result<Signup, DtoError>) -> ValidationError {
        match result {
            Err(DtoError::Invalid(err)) => err,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_payload_and_drops_unknown_keys() {
        let mut payload = valid_signup();
        payload["isAdmin"] = json!(true);

        let dto: Signup = validate_payload(payload, PayloadSource::Json).unwrap();

        assert_eq!(dto.email, "ada@example.com");
        assert_eq!(dto.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(dto.age, None);
    }

    #[test]
    fn reports_every_shape_failure_in_declared_order() {
        let payload = json!({ "password": 1234, "role": "owner" });

        let err = invalid(validate_payload::<Signup>(payload, PayloadSource::Json));

        assert_eq!(err.properties(), vec!["email", "password", "role"]);
        assert!(err.failures[0].constraints.contains_key("isDefined"));
        assert!(err.failures[1].constraints.contains_key("isString"));
        assert_eq!(err.failures[1].value, json!(1234));
        assert!(err.failures[2].constraints["isEnum"].contains("admin, editor, viewer"));
    }

    #[test]
    fn missing_required_field_names_that_property() {
        let mut payload = valid_signup();
        payload.as_object_mut().unwrap().remove("email");

        let err = invalid(validate_payload::<Signup>(payload, PayloadSource::Json));

        assert_eq!(err.properties(), vec!["email"]);
        assert_eq!(err.failures[0].value, Value::Null);
    }

    #[test]
    fn reports_every_value_constraint_failure() {
        let mut payload = valid_signup();
        payload["email"] = json!("not-an-email");
        payload["password"] = json!("short");
        payload["age"] = json!(200);

        let err = invalid(validate_payload::<Signup>(payload, PayloadSource::Json));

        assert_eq!(err.properties(), vec!["email", "password", "age"]);
        assert!(err.failures[0].constraints.contains_key("email"));
        assert_eq!(
            err.failures[1].constraints["length"],
            "password must be at least 8 characters"
        );
        assert_eq!(err.failures[2].value, json!(200));
    }

    #[test]
    fn nested_failures_use_dotted_paths() {
        let mut payload = valid_signup();
        payload["address"] = json!({ "postcode": 12 });

        let err = invalid(validate_payload::<Signup>(payload.clone(), PayloadSource::Json));
        assert_eq!(err.properties(), vec!["address.city", "address.postcode"]);

        payload["address"] = json!({ "city": "" });
        let err = invalid(validate_payload::<Signup>(payload, PayloadSource::Json));
        assert_eq!(err.properties(), vec!["address.city"]);
        assert!(err.failures[0].constraints.contains_key("length"));
    }

    #[test]
    fn query_payloads_coerce_declared_kinds() {
        let mut payload = valid_signup();
        payload["age"] = json!("42");

        let dto: Signup = validate_payload(payload.clone(), PayloadSource::Query).unwrap();
        assert_eq!(dto.age, Some(42));

        let err = invalid(validate_payload::<Signup>(payload, PayloadSource::Json));
        assert_eq!(err.properties(), vec!["age"]);
        assert!(err.failures[0].constraints.contains_key("isInt"));
    }

    #[test]
    fn integers_outside_the_declared_width_are_user_errors() {
        let mut payload = valid_signup();
        payload["age"] = json!(u64::MAX);

        let err = invalid(validate_payload::<Signup>(payload, PayloadSource::Json));
        assert_eq!(err.properties(), vec!["age"]);
        assert!(err.failures[0].constraints["isInt"].contains("out of range"));
        assert_eq!(err.failures[0].value, json!(u64::MAX));
    }

    #[test]
    fn form_payloads_treat_empty_strings_as_absent() {
        let mut payload = valid_signup();
        payload["fullName"] = json!("");

        let dto: Signup = validate_payload(payload, PayloadSource::FormData).unwrap();
        assert_eq!(dto.full_name, None);
    }

    #[test]
    fn non_object_payload_is_rejected_as_body() {
        let err = invalid(validate_payload::<Signup>(json!([1, 2]), PayloadSource::Json));
        assert_eq!(err.properties(), vec!["body"]);
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Mismatched {
        #[allow(dead_code)]
        count: i64,
    }

    impl Dto for Mismatched {
        const FIELDS: &'static [FieldRule] = &[FieldRule::required("count", FieldKind::String)];
    }

    #[test]
    fn rules_disagreeing_with_the_type_are_a_configuration_error() {
        let result = validate_payload::<Mismatched>(json!({ "count": "seven" }), PayloadSource::Json);

        assert_matches!(
            result,
            Err(DtoError::Misconfigured(ConfigurationError::SchemaMismatch { .. }))
        );
    }

    #[test]
    fn snake_case_names_map_to_declared_camel_case() {
        assert_eq!(wire_name("full_name", Signup::FIELDS), "fullName");
        assert_eq!(wire_name("email", Signup::FIELDS), "email");
        assert_eq!(wire_name("unknown_field", Signup::FIELDS), "unknown_field");
    }
}
