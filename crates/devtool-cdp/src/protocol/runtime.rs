//! Runtime domain types: JavaScript evaluation and remote object inspection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters for `Runtime.evaluate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    /// JavaScript expression to evaluate.
    pub expression: String,
    /// Return the value itself rather than a remote object reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
    /// Evaluate as an expression yielding a Promise and await it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
}

impl EvaluateParams {
    /// Evaluate `expression`, returning the resolved value by value.
    #[must_use]
    pub fn returning_value(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            return_by_value: Some(true),
            await_promise: Some(true),
        }
    }
}

/// Parameters for `Runtime.callFunctionOn`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnParams {
    /// Function declaration, e.g. `"function() { ... }"`.
    pub function_declaration: String,
    /// Remote object to call the function on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// Arguments passed to the function.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<CallArgument>>,
    /// Return the value itself rather than a remote object reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
}

/// One argument of `Runtime.callFunctionOn`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgument {
    /// Literal value passed by value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Remote object passed by reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

/// A JavaScript value or object reference as CDP represents it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// CDP object type, e.g. `"object"`, `"string"`, `"undefined"`.
    #[serde(rename = "type")]
    pub object_type: String,
    /// Inlined value, present for primitive results.
    pub value: Option<Value>,
    /// Opaque handle for non-primitive results; valid only on the
    /// connection that produced it.
    pub object_id: Option<String>,
    /// Human-readable description, e.g. a class name.
    pub description: Option<String>,
}

/// Details of a thrown exception, present when evaluation fails.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception message text.
    pub text: String,
    /// Line number the exception occurred on.
    pub line_number: i64,
    /// The thrown value, if it was captured.
    pub exception: Option<RemoteObject>,
}

/// Result of `Runtime.evaluate` and `Runtime.callFunctionOn`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    /// The evaluation result.
    pub result: RemoteObject,
    /// Present when the expression threw.
    pub exception_details: Option<ExceptionDetails>,
}

/// Parameters for `Runtime.getProperties`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesParams {
    /// Object to enumerate properties of.
    pub object_id: String,
    /// Only enumerate own properties, skipping the prototype chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_properties: Option<bool>,
}

/// One property returned by `Runtime.getProperties`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: String,
    /// Property value, absent for accessor-only properties.
    pub value: Option<RemoteObject>,
}

/// Result of `Runtime.getProperties`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesResult {
    /// Every own (or inherited, depending on the request) property.
    pub result: Vec<PropertyDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returning_value_sets_both_flags() {
        let params = EvaluateParams::returning_value("1 + 1");
        assert_eq!(params.return_by_value, Some(true));
        assert_eq!(params.await_promise, Some(true));
    }
}
