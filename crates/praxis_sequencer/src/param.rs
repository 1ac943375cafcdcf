// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed named parameters surfaced to step strategies.

use praxis_graph::action::{Rgba, Vec3};
use serde::{Deserialize, Serialize};

/// Value kind of a step parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// String value
    String,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// 4D vector
    Vector4,
    /// Rotation quaternion
    Quaternion,
    /// Color (RGBA)
    Color,
    /// Entity reference by stable scene ID
    Entity,
    /// Named enum constant
    Enum,
}

/// A parameter value, one of the eleven scene-value kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i32),
    /// Floating point value
    Float(f32),
    /// String value
    String(String),
    /// 2D vector
    Vector2([f32; 2]),
    /// 3D vector
    Vector3(Vec3),
    /// 4D vector
    Vector4([f32; 4]),
    /// Rotation quaternion
    Quaternion([f32; 4]),
    /// Color (RGBA)
    Color(Rgba),
    /// Entity reference by stable scene ID
    Entity(String),
    /// Named enum constant
    Enum(String),
}

impl ParamValue {
    /// The kind tag of this value
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Bool(_) => ParamKind::Bool,
            Self::Int(_) => ParamKind::Int,
            Self::Float(_) => ParamKind::Float,
            Self::String(_) => ParamKind::String,
            Self::Vector2(_) => ParamKind::Vector2,
            Self::Vector3(_) => ParamKind::Vector3,
            Self::Vector4(_) => ParamKind::Vector4,
            Self::Quaternion(_) => ParamKind::Quaternion,
            Self::Color(_) => ParamKind::Color,
            Self::Entity(_) => ParamKind::Entity,
            Self::Enum(_) => ParamKind::Enum,
        }
    }
}

/// Named, typed parameter on a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepParameter {
    /// Lookup name
    pub name: String,
    /// Parameter value
    pub value: ParamValue,
}

impl StepParameter {
    /// Create a named parameter
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Ordered set of step parameters with typed, logging lookups.
///
/// The typed getters never panic: a missing name or a kind mismatch
/// logs an error and returns the type default, so a misauthored
/// parameter degrades a strategy instead of killing the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    params: Vec<StepParameter>,
}

impl ParameterSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Set a parameter, replacing any existing one with the same name
    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.params.push(StepParameter::new(name, value)),
        }
    }

    /// Remove a parameter by name
    pub fn remove(&mut self, name: &str) -> Option<StepParameter> {
        let index = self.params.iter().position(|p| p.name == name)?;
        Some(self.params.remove(index))
    }

    /// Find a value by name
    pub fn find(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Find a value by name, narrowed to a kind
    pub fn find_kind(&self, name: &str, kind: ParamKind) -> Option<&ParamValue> {
        self.find(name).filter(|v| v.kind() == kind)
    }

    /// All parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &StepParameter> {
        self.params.iter()
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn get_or_default<T>(
        &self,
        name: &str,
        kind: ParamKind,
        extract: impl FnOnce(&ParamValue) -> Option<T>,
        default: T,
    ) -> T {
        match self.find(name) {
            Some(value) => match extract(value) {
                Some(extracted) => extracted,
                None => {
                    tracing::error!(
                        name,
                        expected = ?kind,
                        found = ?value.kind(),
                        "Parameter kind mismatch; returning default"
                    );
                    default
                }
            },
            None => {
                tracing::error!(name, expected = ?kind, "Parameter not found; returning default");
                default
            }
        }
    }

    /// Boolean parameter, or `false` when missing/mismatched
    pub fn get_bool(&self, name: &str) -> bool {
        self.get_or_default(
            name,
            ParamKind::Bool,
            |v| match v {
                ParamValue::Bool(b) => Some(*b),
                _ => None,
            },
            false,
        )
    }

    /// Integer parameter, or `0` when missing/mismatched
    pub fn get_int(&self, name: &str) -> i32 {
        self.get_or_default(
            name,
            ParamKind::Int,
            |v| match v {
                ParamValue::Int(i) => Some(*i),
                _ => None,
            },
            0,
        )
    }

    /// Float parameter, or `0.0` when missing/mismatched
    pub fn get_float(&self, name: &str) -> f32 {
        self.get_or_default(
            name,
            ParamKind::Float,
            |v| match v {
                ParamValue::Float(f) => Some(*f),
                _ => None,
            },
            0.0,
        )
    }

    /// String parameter, or empty when missing/mismatched
    pub fn get_string(&self, name: &str) -> String {
        self.get_or_default(
            name,
            ParamKind::String,
            |v| match v {
                ParamValue::String(s) => Some(s.clone()),
                _ => None,
            },
            String::new(),
        )
    }

    /// 2D vector parameter, or zeros when missing/mismatched
    pub fn get_vector2(&self, name: &str) -> [f32; 2] {
        self.get_or_default(
            name,
            ParamKind::Vector2,
            |v| match v {
                ParamValue::Vector2(v) => Some(*v),
                _ => None,
            },
            [0.0; 2],
        )
    }

    /// 3D vector parameter, or zeros when missing/mismatched
    pub fn get_vector3(&self, name: &str) -> Vec3 {
        self.get_or_default(
            name,
            ParamKind::Vector3,
            |v| match v {
                ParamValue::Vector3(v) => Some(*v),
                _ => None,
            },
            [0.0; 3],
        )
    }

    /// 4D vector parameter, or zeros when missing/mismatched
    pub fn get_vector4(&self, name: &str) -> [f32; 4] {
        self.get_or_default(
            name,
            ParamKind::Vector4,
            |v| match v {
                ParamValue::Vector4(v) => Some(*v),
                _ => None,
            },
            [0.0; 4],
        )
    }

    /// Quaternion parameter, or identity when missing/mismatched
    pub fn get_quaternion(&self, name: &str) -> [f32; 4] {
        self.get_or_default(
            name,
            ParamKind::Quaternion,
            |v| match v {
                ParamValue::Quaternion(q) => Some(*q),
                _ => None,
            },
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Color parameter, or opaque black when missing/mismatched
    pub fn get_color(&self, name: &str) -> Rgba {
        self.get_or_default(
            name,
            ParamKind::Color,
            |v| match v {
                ParamValue::Color(c) => Some(*c),
                _ => None,
            },
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Entity-reference parameter, or empty when missing/mismatched
    pub fn get_entity(&self, name: &str) -> String {
        self.get_or_default(
            name,
            ParamKind::Entity,
            |v| match v {
                ParamValue::Entity(e) => Some(e.clone()),
                _ => None,
            },
            String::new(),
        )
    }

    /// Enum-constant parameter, or empty when missing/mismatched
    pub fn get_enum(&self, name: &str) -> String {
        self.get_or_default(
            name,
            ParamKind::Enum,
            |v| match v {
                ParamValue::Enum(e) => Some(e.clone()),
                _ => None,
            },
            String::new(),
        )
    }
}

impl FromIterator<StepParameter> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = StepParameter>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}
