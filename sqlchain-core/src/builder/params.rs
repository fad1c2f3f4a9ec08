//! Placeholder allocation and the ordered bind list

use crate::value::{Bind, ParamType, Value};
use serde::Serialize;

/// One bound value: created once per value-binding call, never mutated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Placeholder name without the leading `:`
    pub placeholder: String,
    pub value: Value,
    pub ty: ParamType,
}

impl Parameter {
    /// The token as it appears in statement text
    pub fn token(&self) -> String {
        format!(":{}", self.placeholder)
    }
}

/// Allocates placeholders namespaced by the owning builder's id.
///
/// No deduplication: binding the same value twice yields two parameters.
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    id: String,
    next: u64,
    params: Vec<Parameter>,
}

impl ParameterRegistry {
    /// Registry with a random namespace
    pub fn new() -> Self {
        Self::with_id(format!("param_{}_", uuid::Uuid::new_v4().simple()))
    }

    /// Registry whose placeholders are `<id>0`, `<id>1`, ...
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            next: 0,
            params: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Record a parameter and return its `:placeholder` token
    pub fn bind(&mut self, bind: Bind) -> String {
        let placeholder = format!("{}{}", self.id, self.next);
        self.next += 1;

        let param = Parameter {
            placeholder,
            value: bind.value,
            ty: bind.ty,
        };
        let token = param.token();
        self.params.push(param);
        token
    }

    /// Append another builder's parameters as-is. Their placeholders carry
    /// that builder's namespace, so nothing is renumbered.
    pub fn merge_from(&mut self, other: &[Parameter]) {
        self.params.extend(other.iter().cloned());
    }

    pub fn as_slice(&self) -> &[Parameter] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
