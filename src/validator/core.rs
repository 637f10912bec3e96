use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

/// How unknown object keys are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationMode {
    /// Extra keys are accepted (path params, headers, query)
    Tolerant,
    /// Object shapes that do not mention `additionalProperties` reject extra keys
    /// (bodies, responses)
    Strict,
}

/// Which part of the exchange a shape applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestPart {
    PathParams,
    Headers,
    Query,
    Body,
    Response,
}

impl RequestPart {
    /// Validation mode the pipeline uses for this part
    #[must_use]
    pub fn default_mode(self) -> ValidationMode {
        match self {
            RequestPart::PathParams | RequestPart::Headers | RequestPart::Query => {
                ValidationMode::Tolerant
            }
            RequestPart::Body | RequestPart::Response => ValidationMode::Strict,
        }
    }
}

impl fmt::Display for RequestPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestPart::PathParams => "pathParams",
            RequestPart::Headers => "headers",
            RequestPart::Query => "query",
            RequestPart::Body => "body",
            RequestPart::Response => "response",
        };
        f.write_str(s)
    }
}

/// One violation reported by the schema library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub message: String,
}

/// Failed validation of one request or response part
///
/// Serialised as-is into the body of a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub part: RequestPart,
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is invalid", self.part)?;
        for (i, issue) in self.issues.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{}", issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Either the parsed value or the validator's error detail, never both
pub type ValidationOutcome = Result<Value, ValidationFailure>;

/// A shape compiled once for a given mode
#[derive(Clone)]
pub struct CompiledShape {
    validator: Arc<jsonschema::Validator>,
    mode: ValidationMode,
}

impl CompiledShape {
    /// Compile `shape` for `mode`, returning the schema library's message on failure
    pub fn compile(shape: &Value, mode: ValidationMode) -> Result<Self, String> {
        let effective = match mode {
            ValidationMode::Tolerant => shape.clone(),
            ValidationMode::Strict => strict_shape(shape),
        };
        let validator = jsonschema::validator_for(&effective).map_err(|e| e.to_string())?;
        Ok(Self {
            validator: Arc::new(validator),
            mode,
        })
    }

    #[must_use]
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Validate `value`, handing it back as the parsed data on success
    pub fn validate(&self, part: RequestPart, value: Value) -> ValidationOutcome {
        let issues: Vec<ValidationIssue> = self
            .validator
            .iter_errors(&value)
            .map(|e| ValidationIssue {
                message: e.to_string(),
            })
            .collect();
        if issues.is_empty() {
            Ok(value)
        } else {
            Err(ValidationFailure { part, issues })
        }
    }
}

impl fmt::Debug for CompiledShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledShape")
            .field("mode", &self.mode)
            .finish()
    }
}

/// One-shot validation without caching
///
/// A shape that does not compile is reported as a failure of `part`.
pub fn validate(value: Value, shape: &Value, mode: ValidationMode, part: RequestPart) -> ValidationOutcome {
    match CompiledShape::compile(shape, mode) {
        Ok(compiled) => compiled.validate(part, value),
        Err(message) => Err(ValidationFailure {
            part,
            issues: vec![ValidationIssue { message }],
        }),
    }
}

/// Keywords whose subschemas describe the same instance as their parent
const IN_PLACE_KEYWORDS: [&str; 5] = ["allOf", "anyOf", "oneOf", "then", "else"];

/// Keywords holding reusable definitions reached through `$ref`
const DEFINITION_KEYWORDS: [&str; 2] = ["$defs", "definitions"];

/// Rewrite a shape so that undeclared object keys are rejected
///
/// A plain object schema (`type: object` or `properties`, no composition)
/// that says nothing about extra keys gets `additionalProperties: false`.
/// A schema that composes its keys from elsewhere (`$ref`, `allOf`, `anyOf`,
/// `oneOf`, `if`/`then`/`else`) gets `unevaluatedProperties: false` instead,
/// which sees every key the referenced or composed subschemas declare. Those
/// subschemas and `$defs`/`definitions` entries stay open themselves and are
/// closed by whoever uses them.
///
/// The rewrite descends into `properties`, `patternProperties`, object-valued
/// `additionalProperties`, `items`, `prefixItems`, the composition keywords
/// and the definition tables.
#[must_use]
pub fn strict_shape(shape: &Value) -> Value {
    close_shape(shape, true)
}

fn close_shape(shape: &Value, close: bool) -> Value {
    let Value::Object(obj) = shape else {
        return shape.clone();
    };
    let mut out = obj.clone();

    let composed = out.contains_key("$ref") || IN_PLACE_KEYWORDS.iter().any(|k| out.contains_key(*k));
    let is_object = out.get("type").is_some_and(|t| match t {
        Value::String(s) => s == "object",
        Value::Array(types) => types.iter().any(|t| t == "object"),
        _ => false,
    }) || out.contains_key("properties");
    let says_open = out.contains_key("additionalProperties") || out.contains_key("unevaluatedProperties");
    if close && !says_open {
        if composed {
            out.insert("unevaluatedProperties".to_string(), Value::Bool(false));
        } else if is_object {
            out.insert("additionalProperties".to_string(), Value::Bool(false));
        }
    }

    for key in ["properties", "patternProperties"] {
        if let Some(Value::Object(props)) = out.get_mut(key) {
            for prop in props.values_mut() {
                *prop = close_shape(prop, true);
            }
        }
    }
    if let Some(extra) = out.get_mut("additionalProperties") {
        if extra.is_object() {
            *extra = close_shape(extra, true);
        }
    }
    for key in ["items", "prefixItems"] {
        match out.get_mut(key) {
            Some(Value::Array(items)) => {
                for item in items.iter_mut() {
                    *item = close_shape(item, true);
                }
            }
            Some(item) if item.is_object() => *item = close_shape(item, true),
            _ => {}
        }
    }
    for key in IN_PLACE_KEYWORDS {
        match out.get_mut(key) {
            Some(Value::Array(branches)) => {
                for branch in branches.iter_mut() {
                    *branch = close_shape(branch, false);
                }
            }
            Some(branch) if branch.is_object() => *branch = close_shape(branch, false),
            _ => {}
        }
    }
    for key in DEFINITION_KEYWORDS {
        if let Some(Value::Object(defs)) = out.get_mut(key) {
            for def in defs.values_mut() {
                *def = close_shape(def, false);
            }
        }
    }
    Value::Object(out)
}
