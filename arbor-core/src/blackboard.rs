use std::collections::BTreeMap;
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{BbType, Value, ValueType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("blackboard key `{0}` is not defined")]
    MissingKey(String),

    #[error("blackboard key `{name}` holds {stored}, requested {requested}")]
    TypeMismatch {
        name: String,
        stored: ValueType,
        requested: ValueType,
    },

    #[error("blackboard key `{0}` is already defined")]
    DuplicateKey(String),
}

/// A compile-time typed handle onto a named key.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: 'static> {
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for BbKey<T> {}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> BbKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

/// Key definition as handed over by the authoring layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyDef {
    pub name: String,
    pub value: Value,
}

impl KeyDef {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Per-agent replacement for a key's initial value, applied at clone time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyOverride {
    pub name: String,
    pub value: Value,
}

impl KeyOverride {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlackboardKey {
    name: String,
    value_type: ValueType,
    value: Value,
}

impl BlackboardKey {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Typed, named shared memory for one tree instance.
///
/// Keys keep their definition order. A key's type is fixed when it is
/// defined; writes of another type are rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blackboard {
    keys: Vec<BlackboardKey>,
    index: BTreeMap<String, usize>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defs(defs: &[KeyDef]) -> Result<Self, BlackboardError> {
        let mut bb = Self::new();
        for def in defs {
            bb.add_key(def.name.clone(), def.value.clone())?;
        }
        Ok(bb)
    }

    pub fn add_key(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), BlackboardError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(BlackboardError::DuplicateKey(name));
        }
        let value = value.into();
        self.index.insert(name.clone(), self.keys.len());
        self.keys.push(BlackboardKey {
            name,
            value_type: value.value_type(),
            value,
        });
        Ok(())
    }

    /// Builder-style [`Blackboard::add_key`]; a duplicate replaces the value
    /// only when the types agree.
    pub fn with_key(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        let result = if self.index.contains_key(&name) {
            self.set_raw(&name, value)
        } else {
            self.add_key(name, value)
        };
        if let Err(err) = result {
            tracing::warn!(%err, "ignoring conflicting blackboard key");
        }
        self
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Keys in definition order.
    pub fn keys(&self) -> impl Iterator<Item = &BlackboardKey> {
        self.keys.iter()
    }

    pub fn key(&self, name: &str) -> Option<&BlackboardKey> {
        self.index.get(name).map(|&i| &self.keys[i])
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.key(name).map(|k| &k.value)
    }

    pub fn get_value<T: BbType>(&self, name: &str) -> Result<T, BlackboardError> {
        let key = self
            .key(name)
            .ok_or_else(|| BlackboardError::MissingKey(name.to_string()))?;
        T::from_value(&key.value).ok_or_else(|| BlackboardError::TypeMismatch {
            name: name.to_string(),
            stored: key.value_type,
            requested: T::TYPE,
        })
    }

    pub fn set_value<T: BbType>(&mut self, name: &str, value: T) -> Result<(), BlackboardError> {
        self.set_raw(name, value.into_value())
    }

    /// Write an untyped value; the key must exist and the type must match.
    pub fn set_raw(&mut self, name: &str, value: Value) -> Result<(), BlackboardError> {
        let Some(&i) = self.index.get(name) else {
            return Err(BlackboardError::MissingKey(name.to_string()));
        };
        let key = &mut self.keys[i];
        if key.value_type != value.value_type() {
            return Err(BlackboardError::TypeMismatch {
                name: name.to_string(),
                stored: key.value_type,
                requested: value.value_type(),
            });
        }
        key.value = value;
        Ok(())
    }

    pub fn get<T: BbType>(&self, key: BbKey<T>) -> Option<T> {
        self.get_value(key.name).ok()
    }

    /// Typed write; defines the key on first use.
    pub fn set<T: BbType>(&mut self, key: BbKey<T>, value: T) -> Result<(), BlackboardError> {
        if self.contains(key.name) {
            self.set_value(key.name, value)
        } else {
            self.add_key(key.name, value.into_value())
        }
    }

    /// Apply per-agent overrides. Unknown keys and type mismatches are
    /// configuration errors: they are logged and skipped.
    ///
    /// Returns how many overrides were applied.
    pub fn apply_overrides(&mut self, overrides: &[KeyOverride]) -> usize {
        let mut applied = 0;
        for o in overrides {
            match self.set_raw(&o.name, o.value.clone()) {
                Ok(()) => applied += 1,
                Err(err) => tracing::warn!(%err, "skipping blackboard override"),
            }
        }
        applied
    }
}
