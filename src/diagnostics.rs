use std::fmt;

use crate::token::Kind;

/// Every diagnostic the scanner, parser and symbol table can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Lexical
    EmptyCharConst,
    MissingQuote,
    UndefinedEscape(char),
    BigNum(String),
    EofInComment,
    EofInChar,
    IllegalLineEnd,
    InvalidChar(char),

    // Syntactic
    TokenExpected(Kind),
    InvalidDecl,
    InvalidMethDecl,
    InvalidStat,
    InvalidFact,
    DesignFollow,
    AssignOp,
    RelOp,
    AddOp,
    MulOp,
    ConstDecl,

    // Semantic
    DeclName(String),
    NotFound(String),
    NoField(String),
    NoType,
    NoOperand,
    NoVal,
    NoMeth,
    NoClass,
    NoClassType,
    NoArray,
    NoLoop,
    ConstType,
    IncompTypes,
    EqCheck,
    NoIntOperand,
    CannotAssignTo(String),
    ArraySize,
    ArrayIndex,
    ParamType,
    MoreActualParams,
    LessActualParams,
    InvalidCall,
    InvalidMethReturnType,
    MainNotVoid,
    MainWithParams,
    MethNotFound(String),
    ReturnVoid,
    ReturnNoVal,
    NonMatchingReturnType,
    ReadValue,
    PrintValue,
    TooManyGlobals,
    TooManyFields,
    TooManyLocals,
    MethodTooLarge,
    ExponentTooLarge,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Message::*;
        match self {
            EmptyCharConst => write!(f, "empty character constant"),
            MissingQuote => write!(f, "missing ' at end of character constant"),
            UndefinedEscape(ch) => write!(f, "undefined escape character sequence \\{}", ch),
            BigNum(digits) => write!(f, "{} too big for integer constant", digits),
            EofInComment => write!(f, "unexpected end of file in comment"),
            EofInChar => write!(f, "unexpected end of file in character constant"),
            IllegalLineEnd => write!(f, "illegal line end in character constant"),
            InvalidChar(ch) => write!(f, "invalid character {:?}", ch),

            TokenExpected(kind) => write!(f, "{} expected", kind),
            InvalidDecl => write!(f, "invalid declaration"),
            InvalidMethDecl => write!(f, "invalid method declaration"),
            InvalidStat => write!(f, "invalid statement"),
            InvalidFact => write!(
                f,
                "invalid start of factor: identifier, number, character constant, new or \"(\" expected"
            ),
            DesignFollow => write!(f, "assignment, method call, increment or decrement expected"),
            AssignOp => write!(f, "assignment operator expected"),
            RelOp => write!(f, "relational operator expected"),
            AddOp => write!(f, "additive operator expected"),
            MulOp => write!(f, "multiplicative operator expected"),
            ConstDecl => write!(f, "number or character constant expected"),

            DeclName(name) => write!(f, "duplicate declaration: {}", name),
            NotFound(name) => write!(f, "not found: {}", name),
            NoField(name) => write!(f, "no such field: {}", name),
            NoType => write!(f, "type expected"),
            NoOperand => write!(f, "operand expected"),
            NoVal => write!(f, "value expected"),
            NoMeth => write!(f, "called object is not a method"),
            NoClass => write!(f, "designator is not an object of a class type"),
            NoClassType => write!(f, "class type expected"),
            NoArray => write!(f, "designator is not an array"),
            NoLoop => write!(f, "break is not within a loop"),
            ConstType => write!(f, "value does not match constant type"),
            IncompTypes => write!(f, "incompatible types"),
            EqCheck => write!(f, "only equality checks (== and !=) allowed for reference types"),
            NoIntOperand => write!(f, "operand(s) must be of type int"),
            CannotAssignTo(what) => write!(f, "cannot assign to {}", what),
            ArraySize => write!(f, "array size must be of type int"),
            ArrayIndex => write!(f, "array index must be of type int"),
            ParamType => write!(f, "parameter type mismatch"),
            MoreActualParams => write!(f, "more actual than formal parameters"),
            LessActualParams => write!(f, "fewer actual than formal parameters"),
            InvalidCall => write!(f, "invalid call of void method"),
            InvalidMethReturnType => write!(f, "method return type must be void or primitive"),
            MainNotVoid => write!(f, "method main must be void"),
            MainWithParams => write!(f, "method main must not have parameters"),
            MethNotFound(name) => write!(f, "method not found: {}", name),
            ReturnVoid => write!(f, "void method must not return a value"),
            ReturnNoVal => write!(f, "return value expected"),
            NonMatchingReturnType => write!(f, "return type must match method type"),
            ReadValue => write!(f, "can only read int or char values"),
            PrintValue => write!(f, "can only print int or char values"),
            TooManyGlobals => write!(f, "too many global variables"),
            TooManyFields => write!(f, "too many fields"),
            TooManyLocals => write!(f, "too many local variables"),
            MethodTooLarge => write!(f, "method too large: jump distance exceeds 32767 bytes"),
            ExponentTooLarge => write!(f, "exponent too large"),
        }
    }
}

/// A reported problem with its source location (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub col: usize,
    pub message: Message,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-- line {} col {}: {}", self.line, self.col, self.message)
    }
}

/// Ordered collection of everything reported during one compilation.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, line: usize, col: usize, message: Message) {
        self.items.push(Diagnostic { line, col, message });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

/// Error sink used by the parser and the symbol table.
///
/// Holds the position of the lookahead token and the distance (in consumed
/// tokens) since the last reported error. Errors closer than
/// `min_distance` to the previous one are swallowed, but still reset the
/// distance.
#[derive(Debug)]
pub struct Reporter {
    diagnostics: Diagnostics,
    min_distance: u32,
    distance: u32,
    line: usize,
    col: usize,
}

impl Reporter {
    pub fn new(min_distance: u32) -> Self {
        Reporter {
            diagnostics: Diagnostics::new(),
            min_distance,
            distance: min_distance,
            line: 1,
            col: 1,
        }
    }

    /// Called for every consumed token; `line`/`col` is the new lookahead.
    pub fn advance(&mut self, line: usize, col: usize) {
        self.line = line;
        self.col = col;
        self.distance = self.distance.saturating_add(1);
    }

    /// Reports `message` at the lookahead position unless it is too close
    /// to the previous error.
    pub fn error(&mut self, message: Message) {
        if self.distance >= self.min_distance {
            self.diagnostics.report(self.line, self.col, message);
        }
        self.distance = 0;
    }

    /// Marks a resynchronisation point without reporting anything.
    pub fn resync(&mut self) {
        self.distance = 0;
    }

    /// Unthrottled access, used by the scanner.
    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}
