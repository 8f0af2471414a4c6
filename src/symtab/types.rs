use crate::symtab::ObjId;

/// Handle to a type in the symbol table's type arena.
///
/// Two handles denote the same type iff they are equal, except for array
/// types which compare by element type (see [`crate::symtab::Tab::same_type`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub const NONE: TypeId = TypeId(0);
    pub const INT: TypeId = TypeId(1);
    pub const CHAR: TypeId = TypeId(2);
    pub const NULL: TypeId = TypeId(3);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    None,
    Int,
    Char,
    Class,
    Array,
}

/// A MicroJava type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Struct {
    pub kind: TypeKind,
    /// Element type, only for arrays.
    pub elem: Option<TypeId>,
    /// Fields in declaration order, only for classes.
    pub fields: Vec<ObjId>,
}

impl Struct {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            elem: None,
            fields: Vec::new(),
        }
    }

    pub fn array_of(elem: TypeId) -> Self {
        Self {
            kind: TypeKind::Array,
            elem: Some(elem),
            fields: Vec::new(),
        }
    }

    pub fn is_ref_type(&self) -> bool {
        matches!(self.kind, TypeKind::Class | TypeKind::Array)
    }

    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }
}
