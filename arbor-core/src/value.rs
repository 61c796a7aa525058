use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque handle to a host-side object (another agent, a pickup, a door).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityRef(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Text,
    Vector,
    Entity,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Text => "text",
            ValueType::Vector => "vector",
            ValueType::Entity => "entity",
        };
        f.write_str(name)
    }
}

/// A blackboard / world-state value.
///
/// `Eq`, `Ord` and `Hash` are canonical (floats compare by `total_cmp`), so
/// values can key maps and planner state sets. Use [`Value::compare`] for the
/// numeric comparison predicates want.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Vector([f32; 3]),
    Entity(EntityRef),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Text(_) => ValueType::Text,
            Value::Vector(_) => ValueType::Vector,
            Value::Entity(_) => ValueType::Entity,
        }
    }

    /// Zero value for a type; used when a key is declared without a value.
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Text => Value::Text(String::new()),
            ValueType::Vector => Value::Vector([0.0; 3]),
            ValueType::Entity => Value::Entity(EntityRef(0)),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Semantic comparison: Int and Float compare numerically, other types
    /// only against themselves. `None` when the values are incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Entity(a), Value::Entity(b)) => Some(a.cmp(b)),
            (Value::Vector(a), Value::Vector(b)) => {
                if a == b {
                    Some(Ordering::Equal)
                } else {
                    None
                }
            }
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::Vector(_) => 4,
            Value::Entity(_) => 5,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Vector(a), Value::Vector(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal),
            (Value::Entity(a), Value::Entity(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Vector(v) => {
                for x in v {
                    x.to_bits().hash(state);
                }
            }
            Value::Entity(e) => e.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Vector([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            Value::Entity(e) => write!(f, "entity#{}", e.0),
        }
    }
}

/// Rust types that can live in a blackboard slot.
pub trait BbType: Sized + 'static {
    const TYPE: ValueType;

    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

macro_rules! bb_type {
    ($ty:ty, $variant:ident, $vt:ident, |$v:ident| $from:expr, |$s:ident| $into:expr) => {
        impl BbType for $ty {
            const TYPE: ValueType = ValueType::$vt;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant($v) => Some($from),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                let $s = self;
                Value::$variant($into)
            }
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                value.into_value()
            }
        }
    };
}

bb_type!(bool, Bool, Bool, |v| *v, |s| s);
bb_type!(i64, Int, Int, |v| *v, |s| s);
bb_type!(i32, Int, Int, |v| i32::try_from(*v).ok()?, |s| s as i64);
bb_type!(f64, Float, Float, |v| *v, |s| s);
bb_type!(f32, Float, Float, |v| *v as f32, |s| s as f64);
bb_type!(String, Text, Text, |v| v.clone(), |s| s);
bb_type!([f32; 3], Vector, Vector, |v| *v, |s| s);
bb_type!(EntityRef, Entity, Entity, |v| *v, |s| s);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}
