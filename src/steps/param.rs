//! Parameter contracts for steps.
//!
//! A [`ParamSpec`] declares one parameter a step accepts: its name, its
//! [`ParamType`], and whether it may be omitted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Concrete parameter binding, keyed by parameter name.
pub type Params = BTreeMap<String, Value>;

/// Declared type of a step parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Integral number.
    Int,
    /// Floating point number.
    Float,
    /// Boolean flag.
    Bool,
    /// String value.
    Str,
    /// Sequence of values.
    List,
    /// Nested mapping.
    Map,
    /// Any non-null value.
    Any,
}

impl ParamType {
    /// Check whether a value satisfies this type.
    ///
    /// Numbers are matched by their representation: `1` is an `Int` and not
    /// a `Float`, `1.0` is a `Float` and not an `Int`.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::Int => value.is_i64() || value.is_u64(),
            ParamType::Float => value.is_f64(),
            ParamType::Bool => value.is_boolean(),
            ParamType::Str => value.is_string(),
            ParamType::List => value.is_array(),
            ParamType::Map => value.is_object(),
            ParamType::Any => !value.is_null(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Bool => "bool",
            ParamType::Str => "str",
            ParamType::List => "list",
            ParamType::Map => "map",
            ParamType::Any => "any",
        };
        write!(f, "{}", s)
    }
}

/// Declaration of a single step parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,

    /// Expected value type.
    #[serde(rename = "type")]
    pub ty: ParamType,

    /// Whether the parameter may be omitted.
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
}

impl ParamSpec {
    /// Declare a required parameter.
    pub fn required(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    /// Declare an optional parameter.
    pub fn optional(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}

fn is_false(v: &bool) -> bool {
    !v
}
