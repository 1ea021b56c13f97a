// Type Hierarchy
//
// Static ancestor chains for every declared type, computed once at startup.
// Used by the converter chain (ancestor fallback) and the parameter binder
// (is this parameter an entity type? does the resolved entity fit it?).

use crate::error::{DispatchError, Result};
use std::collections::HashMap;

/// Root of every entity type
pub const DATA_OBJECT: &str = "DataObject";
pub const DATA_OBJECT_SET: &str = "DataObjectSet";
pub const DATA_LIST: &str = "DataList";
pub const ARRAY_LIST: &str = "ArrayList";
pub const STD_CLASS: &str = "stdClass";

const BUILTIN_ROOTS: [&str; 5] = [DATA_OBJECT, DATA_OBJECT_SET, DATA_LIST, ARRAY_LIST, STD_CLASS];

#[derive(Debug, Clone)]
pub struct TypeHierarchy {
    /// type -> ancestors, most specific first, excluding the type itself
    ancestors: HashMap<String, Vec<String>>,
}

impl TypeHierarchy {
    pub fn builder() -> TypeHierarchyBuilder {
        TypeHierarchyBuilder::new()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.ancestors.contains_key(type_name)
    }

    /// Ancestor tags, most specific first; empty for roots and unknown types
    pub fn ancestors(&self, type_name: &str) -> &[String] {
        self.ancestors
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `type_name` is `ancestor` or descends from it
    pub fn is_a(&self, type_name: &str, ancestor: &str) -> bool {
        self.contains(type_name)
            && (type_name == ancestor || self.ancestors(type_name).iter().any(|a| a == ancestor))
    }

    pub fn is_entity_type(&self, type_name: &str) -> bool {
        self.is_a(type_name, DATA_OBJECT)
    }

    pub fn len(&self) -> usize {
        self.ancestors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ancestors.is_empty()
    }
}

impl Default for TypeHierarchy {
    /// Built-in roots only
    fn default() -> Self {
        Self {
            ancestors: BUILTIN_ROOTS
                .iter()
                .map(|root| (root.to_string(), Vec::new()))
                .collect(),
        }
    }
}

/// Collects `type -> parent` declarations and resolves them into chains
#[derive(Debug, Clone)]
pub struct TypeHierarchyBuilder {
    parents: HashMap<String, Option<String>>,
}

impl TypeHierarchyBuilder {
    fn new() -> Self {
        Self {
            parents: BUILTIN_ROOTS
                .iter()
                .map(|root| (root.to_string(), None))
                .collect(),
        }
    }

    /// Declare a type without a parent
    pub fn root(mut self, type_name: impl Into<String>) -> Self {
        self.parents.insert(type_name.into(), None);
        self
    }

    /// Declare `type_name` as a direct subtype of `parent`
    pub fn declare(mut self, type_name: impl Into<String>, parent: impl Into<String>) -> Self {
        self.parents.insert(type_name.into(), Some(parent.into()));
        self
    }

    /// Shorthand for declaring an entity type directly under `DataObject`
    pub fn entity(self, type_name: impl Into<String>) -> Self {
        self.declare(type_name, DATA_OBJECT)
    }

    pub fn build(self) -> Result<TypeHierarchy> {
        let mut ancestors = HashMap::with_capacity(self.parents.len());

        for type_name in self.parents.keys() {
            let mut chain = Vec::new();
            let mut current = type_name;

            while let Some(Some(parent)) = self.parents.get(current) {
                if !self.parents.contains_key(parent) {
                    return Err(DispatchError::Config(format!(
                        "type {} extends undeclared type {}",
                        current, parent
                    )));
                }
                if parent == type_name || chain.len() > self.parents.len() {
                    return Err(DispatchError::Config(format!(
                        "type {} is part of an inheritance cycle",
                        type_name
                    )));
                }
                chain.push(parent.clone());
                current = parent;
            }

            ancestors.insert(type_name.clone(), chain);
        }

        Ok(TypeHierarchy { ancestors })
    }
}
