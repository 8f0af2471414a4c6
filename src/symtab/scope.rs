//! A single level of name visibility.

use std::collections::HashMap;

use crate::symtab::ObjId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(pub(crate) usize);

/// Names declared at one nesting level, in declaration order.
#[derive(Debug, Default)]
pub struct Scope {
    pub outer: Option<ScopeId>,
    names: HashMap<String, ObjId>,
    locals: Vec<ObjId>,
    n_vars: usize,
}

impl Scope {
    pub fn new(outer: Option<ScopeId>) -> Self {
        Self {
            outer,
            ..Self::default()
        }
    }

    pub fn find_local(&self, name: &str) -> Option<ObjId> {
        self.names.get(name).copied()
    }

    /// Binds `name` to `obj`. Returns false (and keeps the existing binding)
    /// if the name is already declared here.
    pub fn insert(&mut self, name: &str, obj: ObjId, is_var: bool) -> bool {
        if self.names.contains_key(name) {
            return false;
        }
        self.names.insert(name.to_string(), obj);
        self.locals.push(obj);
        if is_var {
            self.n_vars += 1;
        }
        true
    }

    pub fn locals(&self) -> &[ObjId] {
        &self.locals
    }

    pub fn n_vars(&self) -> usize {
        self.n_vars
    }
}
