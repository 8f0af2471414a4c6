use crate::symtab::TypeId;

/// Handle to a declared object in the symbol table's object arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
    Constant,
    Variable,
    Type,
    Method,
    Program,
}

/// A declared name.
#[derive(Debug, Clone)]
pub struct Obj {
    pub kind: ObjKind,
    pub name: String,
    pub ty: TypeId,
    /// Constant value.
    pub val: i32,
    /// Variable slot, field offset or method entry address.
    pub adr: i32,
    /// Declaration level of variables: 0 = global, 1 = local or field.
    pub level: i32,
    /// Number of parameters of a method.
    pub n_pars: usize,
    /// Methods: parameters followed by locals, in slot order.
    /// Program: the global declarations.
    pub locals: Vec<ObjId>,
}

impl Obj {
    pub fn new(kind: ObjKind, name: impl Into<String>, ty: TypeId) -> Self {
        Obj {
            kind,
            name: name.into(),
            ty,
            val: 0,
            adr: 0,
            level: 0,
            n_pars: 0,
            locals: Vec::new(),
        }
    }

    /// Formal parameters of a method, in declaration order.
    pub fn params(&self) -> &[ObjId] {
        &self.locals[..self.n_pars.min(self.locals.len())]
    }
}
