//! Typed tile property values (bool, int, float, string)

use crate::CatalogError;
use serde::{Deserialize, Serialize};

/// Declared type of a tile property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Bool,
    Int,
    Float,
    /// Untyped properties in a tileset file are strings
    #[default]
    String,
}

impl PropertyType {
    /// Get the name used for this type in tileset files
    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::Bool => "bool",
            PropertyType::Int => "int",
            PropertyType::Float => "float",
            PropertyType::String => "string",
        }
    }
}

/// A typed property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    /// Get the declared type of this value
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Bool(_) => PropertyType::Bool,
            PropertyValue::Int(_) => PropertyType::Int,
            PropertyValue::Float(_) => PropertyType::Float,
            PropertyValue::String(_) => PropertyType::String,
        }
    }

    /// Get value as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get value as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get value as float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get value as string reference
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON value to a property value of the declared type.
    ///
    /// Tileset files store whole floats without a decimal point and sometimes
    /// quote numbers, so numeric strings are accepted for numeric types.
    pub fn from_json(prop_type: PropertyType, json: serde_json::Value) -> Result<Self, String> {
        use serde_json::Value as Json;

        match (prop_type, json) {
            (PropertyType::Bool, Json::Bool(b)) => Ok(PropertyValue::Bool(b)),
            (PropertyType::Bool, Json::String(s)) => match s.as_str() {
                "true" => Ok(PropertyValue::Bool(true)),
                "false" => Ok(PropertyValue::Bool(false)),
                _ => Err(format!("expected a bool, got \"{s}\"")),
            },
            (PropertyType::Int, Json::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Ok(PropertyValue::Int(i))
                } else {
                    match n.as_f64() {
                        // Whole floats only, and only those i64 holds exactly
                        Some(f)
                            if f.fract() == 0.0
                                && f >= i64::MIN as f64
                                && f < i64::MAX as f64 =>
                        {
                            Ok(PropertyValue::Int(f as i64))
                        }
                        _ => Err(format!("expected an integer, got {n}")),
                    }
                }
            }
            (PropertyType::Int, Json::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(PropertyValue::Int)
                .map_err(|_| format!("expected an integer, got \"{s}\"")),
            (PropertyType::Float, Json::Number(n)) => n
                .as_f64()
                .map(PropertyValue::Float)
                .ok_or_else(|| format!("expected a float, got {n}")),
            (PropertyType::Float, Json::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(PropertyValue::Float)
                .map_err(|_| format!("expected a float, got \"{s}\"")),
            (PropertyType::String, Json::String(s)) => Ok(PropertyValue::String(s)),
            (PropertyType::String, Json::Number(n)) => Ok(PropertyValue::String(n.to_string())),
            (PropertyType::String, Json::Bool(b)) => Ok(PropertyValue::String(b.to_string())),
            (ty, other) => Err(format!("expected a {}, got {}", ty.name(), other)),
        }
    }

    /// Convert to serde_json::Value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::Bool(b) => serde_json::Value::Bool(*b),
            PropertyValue::Int(i) => serde_json::json!(*i),
            PropertyValue::Float(f) => serde_json::json!(*f),
            PropertyValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Int(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<f32> for PropertyValue {
    fn from(f: f32) -> Self {
        PropertyValue::Float(f as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

/// A named property attached to a tile definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProperty", into = "RawProperty")]
pub struct TileProperty {
    pub name: String,
    pub value: PropertyValue,
}

impl TileProperty {
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// On-disk shape of a property: `{"name": .., "type": .., "value": ..}`
#[derive(Serialize, Deserialize)]
struct RawProperty {
    name: String,
    #[serde(rename = "type", default)]
    prop_type: PropertyType,
    value: serde_json::Value,
}

impl TryFrom<RawProperty> for TileProperty {
    type Error = CatalogError;

    fn try_from(raw: RawProperty) -> Result<Self, Self::Error> {
        let value = PropertyValue::from_json(raw.prop_type, raw.value).map_err(|reason| {
            CatalogError::InvalidProperty {
                name: raw.name.clone(),
                reason,
            }
        })?;
        Ok(Self {
            name: raw.name,
            value,
        })
    }
}

impl From<TileProperty> for RawProperty {
    fn from(property: TileProperty) -> Self {
        Self {
            prop_type: property.value.property_type(),
            value: property.value.to_json(),
            name: property.name,
        }
    }
}
