//! Symbol table: nested scopes, declared objects and types.
//!
//! Scopes, objects and types live in arenas owned by [`Tab`] and are
//! addressed by index, so a method keeps its locals (and a class its
//! fields) after the declaring scope has been closed.

mod obj;
mod scope;
mod types;

pub use obj::{Obj, ObjId, ObjKind};
pub use scope::{Scope, ScopeId};
pub use types::{Struct, TypeId, TypeKind};

use crate::diagnostics::{Message, Reporter};

pub struct Tab {
    objs: Vec<Obj>,
    types: Vec<Struct>,
    scopes: Vec<Scope>,
    cur: ScopeId,
    /// Universe = -1, globals = 0, locals and fields = 1.
    level: i32,

    no_obj: ObjId,
    chr_obj: ObjId,
    ord_obj: ObjId,
    len_obj: ObjId,
}

impl Tab {
    /// Creates a table whose only open scope is the universe.
    pub fn new() -> Self {
        let mut tab = Tab {
            objs: Vec::new(),
            types: vec![
                Struct::new(TypeKind::None),
                Struct::new(TypeKind::Int),
                Struct::new(TypeKind::Char),
                Struct::new(TypeKind::Class),
            ],
            scopes: vec![Scope::new(None)],
            cur: ScopeId(0),
            level: -1,
            no_obj: ObjId(0),
            chr_obj: ObjId(0),
            ord_obj: ObjId(0),
            len_obj: ObjId(0),
        };

        tab.no_obj = tab.alloc(Obj::new(ObjKind::Variable, "noObj", TypeId::NONE));

        tab.bind(ObjKind::Type, "int", TypeId::INT);
        tab.bind(ObjKind::Type, "char", TypeId::CHAR);
        tab.bind(ObjKind::Constant, "null", TypeId::NULL);

        tab.chr_obj = tab.builtin_method("chr", TypeId::CHAR, "i", TypeId::INT);
        tab.ord_obj = tab.builtin_method("ord", TypeId::INT, "ch", TypeId::CHAR);
        let any_array = tab.new_array(TypeId::NONE);
        tab.len_obj = tab.builtin_method("len", TypeId::INT, "arr", any_array);

        tab
    }

    fn builtin_method(&mut self, name: &str, ret: TypeId, par: &str, par_ty: TypeId) -> ObjId {
        let meth = self.bind(ObjKind::Method, name, ret).0;
        let mut param = Obj::new(ObjKind::Variable, par, par_ty);
        param.level = 1;
        let param = self.alloc(param);

        let m = self.obj_mut(meth);
        m.locals = vec![param];
        m.n_pars = 1;
        meth
    }

    // ----- scopes

    pub fn open_scope(&mut self) {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(Some(self.cur)));
        self.cur = id;
        self.level += 1;
    }

    pub fn close_scope(&mut self) {
        if let Some(outer) = self.scopes[self.cur.0].outer {
            self.cur = outer;
            self.level -= 1;
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Objects declared in the innermost open scope, in declaration order.
    pub fn current_locals(&self) -> Vec<ObjId> {
        self.scopes[self.cur.0].locals().to_vec()
    }

    /// Number of variables declared in the innermost open scope.
    pub fn current_var_count(&self) -> usize {
        self.scopes[self.cur.0].n_vars()
    }

    // ----- declarations and lookup

    fn alloc(&mut self, obj: Obj) -> ObjId {
        let id = ObjId(self.objs.len());
        self.objs.push(obj);
        id
    }

    /// Creates an object in the current scope. Returns the object and
    /// whether it was bound to its name (false for duplicates).
    fn bind(&mut self, kind: ObjKind, name: &str, ty: TypeId) -> (ObjId, bool) {
        let mut obj = Obj::new(kind, name, ty);
        let scope = &self.scopes[self.cur.0];
        if kind == ObjKind::Variable {
            obj.adr = scope.n_vars() as i32;
            obj.level = self.level;
        }

        let id = self.alloc(obj);
        let bound = self.scopes[self.cur.0].insert(name, id, kind == ObjKind::Variable);
        (id, bound)
    }

    /// Declares `name` in the current scope.
    ///
    /// Variables get the next free slot of the scope. A name already declared
    /// in the same scope is reported; the new object is still created and
    /// returned, but lookups keep resolving to the first declaration.
    pub fn insert(&mut self, kind: ObjKind, name: &str, ty: TypeId, reporter: &mut Reporter) -> ObjId {
        let (id, bound) = self.bind(kind, name, ty);
        if !bound {
            reporter.error(Message::DeclName(name.to_string()));
        }
        id
    }

    /// Resolves `name` from the innermost scope outwards.
    pub fn lookup(&self, name: &str) -> Option<ObjId> {
        let mut scope = Some(self.cur);
        while let Some(id) = scope {
            let s = &self.scopes[id.0];
            if let Some(obj) = s.find_local(name) {
                return Some(obj);
            }
            scope = s.outer;
        }
        None
    }

    /// Like [`Tab::lookup`], but reports unknown names and returns `noObj`.
    pub fn find(&self, name: &str, reporter: &mut Reporter) -> ObjId {
        match self.lookup(name) {
            Some(obj) => obj,
            None => {
                reporter.error(Message::NotFound(name.to_string()));
                self.no_obj
            }
        }
    }

    /// Looks `name` up among the fields of `ty` only.
    pub fn find_field(&self, name: &str, ty: TypeId, reporter: &mut Reporter) -> ObjId {
        let field = self
            .ty(ty)
            .fields
            .iter()
            .copied()
            .find(|f| self.obj(*f).name == name);
        match field {
            Some(obj) => obj,
            None => {
                reporter.error(Message::NoField(name.to_string()));
                self.no_obj
            }
        }
    }

    /// The object behind an id.
    pub fn obj(&self, id: ObjId) -> &Obj {
        &self.objs[id.0]
    }

    /// Mutable access, used to fill in addresses, values and locals after insertion.
    pub fn obj_mut(&mut self, id: ObjId) -> &mut Obj {
        &mut self.objs[id.0]
    }

    /// Placeholder object returned by failed lookups.
    pub fn no_obj(&self) -> ObjId {
        self.no_obj
    }

    /// The predeclared `chr` method.
    pub fn chr_obj(&self) -> ObjId {
        self.chr_obj
    }

    /// The predeclared `ord` method.
    pub fn ord_obj(&self) -> ObjId {
        self.ord_obj
    }

    /// The predeclared `len` method.
    pub fn len_obj(&self) -> ObjId {
        self.len_obj
    }

    // ----- types

    /// The type behind an id.
    pub fn ty(&self, id: TypeId) -> &Struct {
        &self.types[id.0]
    }

    /// A fresh array type; every declaration site gets its own instance.
    pub fn new_array(&mut self, elem: TypeId) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(Struct::array_of(elem));
        id
    }

    /// A fresh class type without fields; see [`Tab::set_fields`].
    pub fn new_class(&mut self) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(Struct::new(TypeKind::Class));
        id
    }

    /// Attaches the fields of a class once its body is closed.
    pub fn set_fields(&mut self, class: TypeId, fields: Vec<ObjId>) {
        self.types[class.0].fields = fields;
    }

    /// Shorthand for `self.ty(id).kind`.
    pub fn kind(&self, id: TypeId) -> TypeKind {
        self.ty(id).kind
    }

    /// Whether values of the type are heap references (classes and arrays).
    pub fn is_ref_type(&self, id: TypeId) -> bool {
        self.ty(id).is_ref_type()
    }

    /// Element type of an array, `noType` for anything else.
    pub fn elem_type(&self, id: TypeId) -> TypeId {
        self.ty(id).elem.unwrap_or(TypeId::NONE)
    }

    /// Type identity: nominal, except that arrays compare by element type.
    pub fn same_type(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        match (self.ty(a), self.ty(b)) {
            (
                Struct {
                    kind: TypeKind::Array,
                    elem: Some(x),
                    ..
                },
                Struct {
                    kind: TypeKind::Array,
                    elem: Some(y),
                    ..
                },
            ) => self.same_type(*x, *y),
            _ => false,
        }
    }

    /// Comparison compatibility (`==`, `<`, ...); symmetric.
    pub fn compatible(&self, a: TypeId, b: TypeId) -> bool {
        self.same_type(a, b)
            || (a == TypeId::NULL && self.is_ref_type(b))
            || (b == TypeId::NULL && self.is_ref_type(a))
    }

    /// Whether a value of type `src` may be stored into a `dest` location.
    pub fn assignable(&self, src: TypeId, dest: TypeId) -> bool {
        self.same_type(src, dest)
            || (src == TypeId::NULL && self.is_ref_type(dest))
            || (self.kind(src) == TypeKind::Array
                && self.kind(dest) == TypeKind::Array
                && self.elem_type(dest) == TypeId::NONE)
    }
}

impl Default for Tab {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter() -> Reporter {
        Reporter::new(0)
    }

    #[test]
    fn test_universe_is_seeded() {
        let tab = Tab::new();
        let int = tab.lookup("int").map(|o| tab.obj(o).ty);
        assert_eq!(int, Some(TypeId::INT));
        assert_eq!(tab.lookup("null").map(|o| tab.obj(o).kind), Some(ObjKind::Constant));

        let len = tab.obj(tab.len_obj());
        assert_eq!(len.kind, ObjKind::Method);
        assert_eq!(len.n_pars, 1);
        assert_eq!(tab.kind(tab.obj(len.locals[0]).ty), TypeKind::Array);
        assert_eq!(tab.obj(tab.chr_obj()).ty, TypeId::CHAR);
        assert_eq!(tab.obj(tab.ord_obj()).ty, TypeId::INT);
        assert_eq!(tab.level(), -1);
    }

    #[test]
    fn test_variables_get_consecutive_slots() {
        let mut tab = Tab::new();
        let mut r = reporter();
        tab.open_scope();
        let a = tab.insert(ObjKind::Variable, "a", TypeId::INT, &mut r);
        let k = tab.insert(ObjKind::Constant, "k", TypeId::INT, &mut r);
        let b = tab.insert(ObjKind::Variable, "b", TypeId::CHAR, &mut r);
        assert_eq!(tab.obj(a).adr, 0);
        assert_eq!(tab.obj(b).adr, 1);
        assert_eq!(tab.obj(a).level, 0);
        assert_eq!(tab.current_var_count(), 2);
        assert_eq!(tab.current_locals(), vec![a, k, b]);

        tab.open_scope();
        let c = tab.insert(ObjKind::Variable, "c", TypeId::INT, &mut r);
        assert_eq!((tab.obj(c).adr, tab.obj(c).level), (0, 1));
        assert!(r.diagnostics().is_empty());
    }

    #[test]
    fn test_duplicate_declaration_keeps_first() {
        let mut tab = Tab::new();
        let mut r = reporter();
        tab.open_scope();
        let first = tab.insert(ObjKind::Variable, "x", TypeId::INT, &mut r);
        let second = tab.insert(ObjKind::Variable, "x", TypeId::CHAR, &mut r);
        assert_ne!(first, second);

        let msgs: Vec<_> = r.diagnostics().iter().map(|d| d.message.clone()).collect();
        assert_eq!(msgs, vec![Message::DeclName("x".to_string())]);
        assert_eq!(tab.find("x", &mut r), first);
        assert_eq!(tab.current_var_count(), 1);
    }

    #[test]
    fn test_shadowing_across_scopes() {
        let mut tab = Tab::new();
        let mut r = reporter();
        tab.open_scope();
        let global = tab.insert(ObjKind::Variable, "x", TypeId::INT, &mut r);
        tab.open_scope();
        let local = tab.insert(ObjKind::Variable, "x", TypeId::CHAR, &mut r);
        assert_eq!(tab.find("x", &mut r), local);
        tab.close_scope();
        assert_eq!(tab.find("x", &mut r), global);
        assert!(r.diagnostics().is_empty());
    }

    #[test]
    fn test_find_unknown_returns_sentinel() {
        let tab = Tab::new();
        let mut r = reporter();
        assert_eq!(tab.find("nope", &mut r), tab.no_obj());
        assert_eq!(
            r.diagnostics().iter().next().map(|d| d.message.clone()),
            Some(Message::NotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_find_field_does_not_search_outwards() {
        let mut tab = Tab::new();
        let mut r = reporter();
        tab.open_scope();
        tab.insert(ObjKind::Variable, "outer", TypeId::INT, &mut r);
        let class = tab.new_class();
        tab.open_scope();
        let f = tab.insert(ObjKind::Variable, "f", TypeId::INT, &mut r);
        let fields = tab.current_locals();
        tab.close_scope();
        tab.set_fields(class, fields);

        assert_eq!(tab.find_field("f", class, &mut r), f);
        assert_eq!(tab.find_field("outer", class, &mut r), tab.no_obj());
        assert_eq!(tab.ty(class).n_fields(), 1);
        assert_eq!(r.diagnostics().len(), 1);
    }

    #[test]
    fn test_array_types_are_structural() {
        let mut tab = Tab::new();
        let a = tab.new_array(TypeId::INT);
        let b = tab.new_array(TypeId::INT);
        let c = tab.new_array(TypeId::CHAR);
        assert_ne!(a, b);
        assert!(tab.same_type(a, b));
        assert!(!tab.same_type(a, c));
        assert!(tab.assignable(a, b));
        assert!(!tab.assignable(c, a));
    }

    #[test]
    fn test_classes_are_nominal() {
        let mut tab = Tab::new();
        let a = tab.new_class();
        let b = tab.new_class();
        assert!(!tab.assignable(a, b));
        assert!(tab.assignable(a, a));
        assert!(tab.assignable(TypeId::NULL, a));
        assert!(!tab.assignable(a, TypeId::NULL));
    }

    #[test]
    fn test_no_numeric_promotion() {
        let tab = Tab::new();
        assert!(!tab.assignable(TypeId::CHAR, TypeId::INT));
        assert!(!tab.assignable(TypeId::INT, TypeId::CHAR));
        assert!(!tab.assignable(TypeId::NULL, TypeId::INT));
    }

    #[test]
    fn test_len_accepts_any_array() {
        let mut tab = Tab::new();
        let chars = tab.new_array(TypeId::CHAR);
        let param = tab.obj(tab.len_obj()).params()[0];
        assert!(tab.assignable(chars, tab.obj(param).ty));
    }

    #[test]
    fn test_compatible_is_symmetric() {
        let mut tab = Tab::new();
        let class = tab.new_class();
        assert!(tab.compatible(class, TypeId::NULL));
        assert!(tab.compatible(TypeId::NULL, class));
        assert!(tab.compatible(TypeId::INT, TypeId::INT));
        assert!(!tab.compatible(TypeId::INT, TypeId::CHAR));
    }
}
