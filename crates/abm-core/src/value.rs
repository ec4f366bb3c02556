//! Dynamic attribute values and non-owning agent references.
//!
//! Agents carry a string-keyed attribute map whose values are [`AttrValue`] —
//! a small closed set of tagged variants rather than open-ended trait objects.
//! The behavior layer that computes these values is external to this crate;
//! here they are just data that can be stored, compared, and snapshotted.

use std::fmt;

use crate::geometry::Point;
use crate::ids::AgentIndex;

// ── AgentRef ──────────────────────────────────────────────────────────────────

/// A non-owning reference to an agent: species name + index within that
/// species' population.
///
/// `AgentRef` is a handle, never a second owner — the population's agent
/// sequence is the sole owner of agent storage.  A handle may dangle (the
/// agent may have died since the handle was taken); callers resolve it
/// against a live population and handle the miss.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentRef {
    /// Simple species name of the referenced agent's population.
    pub species: String,
    /// The referenced agent's index within that population.
    pub index: AgentIndex,
}

impl AgentRef {
    pub fn new(species: impl Into<String>, index: AgentIndex) -> Self {
        Self { species: species.into(), index }
    }
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.species, self.index.0)
    }
}

// ── AttrValue ─────────────────────────────────────────────────────────────────

/// A dynamically typed agent attribute value.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    /// The absent value.  Reading an attribute that was never written yields
    /// `None` at the map level; `Nil` is an explicitly stored "nothing".
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Point(Point),
    /// A reference to another agent (e.g. a mirror's `target`).
    Agent(AgentRef),
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Short type tag, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Nil => "nil",
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "string",
            AttrValue::Point(_) => "point",
            AttrValue::Agent(_) => "agent",
            AttrValue::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric widening: `Int` values read as floats too.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(f) => Some(*f),
            AttrValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            AttrValue::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_agent(&self) -> Option<&AgentRef> {
        match self {
            AttrValue::Agent(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, AttrValue::Nil)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<Point> for AttrValue {
    fn from(p: Point) -> Self {
        AttrValue::Point(p)
    }
}

impl From<AgentRef> for AttrValue {
    fn from(r: AgentRef) -> Self {
        AttrValue::Agent(r)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Nil => write!(f, "nil"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
            AttrValue::Str(s) => write!(f, "{s}"),
            AttrValue::Point(p) => write!(f, "{p}"),
            AttrValue::Agent(r) => write!(f, "{r}"),
            AttrValue::List(vs) => {
                write!(f, "[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}
