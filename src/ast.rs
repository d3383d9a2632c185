//! Syntax tree for the narrated Go subset.
//!
//! The tree is arena-allocated: expression, type, statement and declaration
//! nodes live in typed arenas inside [`AstArena`] and reference each other
//! through `Idx`-based IDs. Every arena node is wrapped in [`Spanned`] so the
//! narration engine can ask "which source lines does this node cover" for any
//! node it is about to speak.
//!
//! Types and expressions are separate sum types. This is load-bearing for
//! narration: a pointer reads "pointer to" in type position
//! ([`Type::Pointer`]) but "contents of" in expression position
//! ([`Expr::Star`]), and the split lets the dispatcher pick the phrasing
//! without threading a context flag through every call.

use la_arena::{Arena, Idx};
use smallvec::SmallVec;

/// Type-safe index into the declarations arena.
pub type DeclId = Idx<Spanned<Decl>>;

/// Type-safe index into the statements arena.
pub type StmtId = Idx<Spanned<Stmt>>;

/// Type-safe index into the expressions arena.
pub type ExprId = Idx<Spanned<Expr>>;

/// Type-safe index into the types arena.
pub type TypeId = Idx<Spanned<Type>>;

/// Source location range (byte offsets, end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// An AST node paired with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

/// Identifier occurrence: text plus its own span.
///
/// Names keep their text inline; the narrator reads each name exactly once,
/// so interning would buy nothing here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub text: String,
    pub span: Span,
}

/// Central arena that owns all AST node memory.
#[derive(Debug, Default, PartialEq)]
pub struct AstArena {
    decls: Arena<Spanned<Decl>>,
    stmts: Arena<Spanned<Stmt>>,
    exprs: Arena<Spanned<Expr>>,
    types: Arena<Spanned<Type>>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_decl(&mut self, decl: Decl, span: Span) -> DeclId {
        self.decls.alloc(Spanned { node: decl, span })
    }

    #[inline]
    pub fn alloc_stmt(&mut self, stmt: Stmt, span: Span) -> StmtId {
        self.stmts.alloc(Spanned { node: stmt, span })
    }

    #[inline]
    pub fn alloc_expr(&mut self, expr: Expr, span: Span) -> ExprId {
        self.exprs.alloc(Spanned { node: expr, span })
    }

    #[inline]
    pub fn alloc_type(&mut self, typ: Type, span: Span) -> TypeId {
        self.types.alloc(Spanned { node: typ, span })
    }

    #[inline]
    pub fn decl(&self, id: DeclId) -> &Spanned<Decl> {
        &self.decls[id]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Spanned<Stmt> {
        &self.stmts[id]
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Spanned<Expr> {
        &self.exprs[id]
    }

    #[inline]
    pub fn typ(&self, id: TypeId) -> &Spanned<Type> {
        &self.types[id]
    }
}

/// Root node: one parsed Go source file.
#[derive(Debug, PartialEq)]
pub struct SourceFile {
    /// Package name from the `package` clause.
    pub package_name: Name,
    /// Span of the `package` clause (visibility anchor for the file header).
    pub package_span: Span,
    /// Import declarations, in source order.
    pub imports: Vec<ImportSpec>,
    /// Top-level declarations, in source order (imports excluded).
    pub decls: Vec<TopLevelDecl>,
    /// The arena that owns all nodes referenced above.
    pub arena: AstArena,
}

/// Import specification: `import "path"` / `import alias "path"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Alias, dot (`.`) or blank (`_`) name, when present.
    pub alias: Option<Name>,
    /// Raw path literal text, quotes included.
    pub path: BasicLit,
    pub span: Span,
}

/// Top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TopLevelDecl {
    Decl(DeclId),
    Func(FuncDecl),
}

/// Declaration node.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Gen(GenDecl),
    /// Unparseable declaration; the span locates the raw text to recover.
    Bad,
}

/// Generic declaration: `const`, `type` or `var`, grouped or not.
#[derive(Debug, Clone, PartialEq)]
pub struct GenDecl {
    pub kind: GenDeclKind,
    pub specs: Vec<Spanned<Spec>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenDeclKind {
    Const,
    Type,
    Var,
}

/// One specification inside a generic declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    Value(ValueSpec),
    Type(TypeSpec),
}

/// `names [type] [= values]` for const and var declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub names: SmallVec<[Name; 2]>,
    pub typ: Option<TypeId>,
    pub values: SmallVec<[ExprId; 2]>,
}

/// `type Name = T` / `type Name T`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Name,
    pub typ: TypeId,
    pub alias: bool,
}

/// Function or method declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    /// Receiver field list; present only for methods.
    pub recv: Option<FieldList>,
    pub name: Name,
    pub signature: Signature,
    /// Absent for forward declarations (assembly stubs etc.).
    pub body: Option<Block>,
    pub span: Span,
}

/// Parameters and results of a function.
///
/// An absent field list (`None` at the use site) and a present-but-empty one
/// narrate identically, but they are distinct states and both occur: `func
/// f()` has empty params and absent results.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Option<FieldList>,
    pub results: Option<FieldList>,
}

/// Ordered field list, shared by parameters, results, receivers, struct
/// fields and interface methods.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldList {
    pub fields: Vec<Field>,
    pub span: Span,
}

impl FieldList {
    /// Number of declared entries: named fields count once per name,
    /// anonymous fields count once.
    pub fn num_fields(&self) -> usize {
        self.fields
            .iter()
            .map(|f| if f.names.is_empty() { 1 } else { f.names.len() })
            .sum()
    }
}

/// One field: zero or more names sharing a type, plus an optional tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: SmallVec<[Name; 2]>,
    /// `...` before the type (variadic parameter).
    pub variadic: bool,
    pub typ: TypeId,
    /// Struct tag literal, when present.
    pub tag: Option<ExprId>,
}

/// Brace-delimited statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<StmtId>,
    pub span: Span,
}

/// Statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Decl(DeclId),
    Empty,
    Labeled {
        label: Name,
        stmt: StmtId,
    },
    Expr(ExprId),
    Send {
        chan: ExprId,
        value: ExprId,
    },
    IncDec {
        expr: ExprId,
        op: IncDecOp,
    },
    Assign {
        lhs: SmallVec<[ExprId; 2]>,
        op: AssignOp,
        rhs: SmallVec<[ExprId; 2]>,
    },
    Go(ExprId),
    Defer(ExprId),
    Return(SmallVec<[ExprId; 2]>),
    Branch {
        kind: BranchKind,
        label: Option<Name>,
    },
    Block(Block),
    If(IfStmt),
    For(ForStmt),
    Switch(SwitchStmt),
    TypeSwitch(TypeSwitchStmt),
    Select(SelectStmt),
    /// Unparseable statement; span locates the raw text to recover.
    Bad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc,
    Dec,
}

/// Assignment operator. `:=` folds in as [`AssignOp::Define`]; narration
/// treats every variant the same way, but the parser keeps the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Define,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

impl BranchKind {
    /// The keyword, which is also the spoken phrase.
    pub fn word(self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
            BranchKind::Goto => "goto",
            BranchKind::Fallthrough => "fallthrough",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub init: Option<StmtId>,
    pub cond: ExprId,
    pub then_block: Block,
    /// Else branch: a block, or another `If` for else-if chains.
    pub else_stmt: Option<StmtId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub kind: ForKind,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForKind {
    /// `for { }`
    Infinite,
    /// `for cond { }`
    Cond(ExprId),
    /// `for init; cond; post { }`
    Clause {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        post: Option<StmtId>,
    },
    /// `for k, v := range x { }`
    Range {
        key: Option<ExprId>,
        value: Option<ExprId>,
        define: bool,
        expr: ExprId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub init: Option<StmtId>,
    pub tag: Option<ExprId>,
    pub clauses: Vec<Spanned<SwitchClause>>,
    /// Span of the braced clause body (closing-marker visibility).
    pub body_span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSwitchStmt {
    pub init: Option<StmtId>,
    /// `v := x.(type)` binding, when present.
    pub bind: Option<Name>,
    pub expr: ExprId,
    pub clauses: Vec<Spanned<SwitchClause>>,
    pub body_span: Span,
}

/// Case clause of an expression or type switch.
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchClause {
    Expr {
        exprs: SmallVec<[ExprId; 2]>,
        stmts: Vec<StmtId>,
    },
    Type {
        types: SmallVec<[TypeId; 2]>,
        stmts: Vec<StmtId>,
    },
    Default {
        stmts: Vec<StmtId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub clauses: Vec<Spanned<CommClause>>,
    pub body_span: Span,
}

/// Select clause: a communication case or `default`.
#[derive(Debug, Clone, PartialEq)]
pub enum CommClause {
    Comm { comm: CommStmt, stmts: Vec<StmtId> },
    Default { stmts: Vec<StmtId> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommStmt {
    /// `ch <- v`
    Send { chan: ExprId, value: ExprId },
    /// `x := <-ch`, `x = <-ch` or bare `<-ch`; `expr` is the receive.
    Recv {
        lhs: SmallVec<[ExprId; 2]>,
        define: bool,
        expr: ExprId,
    },
}

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    BasicLit(BasicLit),
    /// `T{...}` / `{...}` (type elided inside composite literals).
    CompositeLit {
        typ: Option<TypeId>,
        /// Opening brace position (visibility of the "containing" marker).
        l_brace: Span,
        elements: Vec<ExprId>,
    },
    /// `key: value` inside a composite literal.
    KeyValue { key: ExprId, value: ExprId },
    FuncLit {
        signature: Signature,
        body: Block,
    },
    Paren {
        l_paren: Span,
        expr: ExprId,
        r_paren: Span,
    },
    Selector {
        expr: ExprId,
        sel: Name,
    },
    Index {
        expr: ExprId,
        l_brack: Span,
        index: ExprId,
    },
    Slice {
        expr: ExprId,
        l_brack: Span,
        low: Option<ExprId>,
        high: Option<ExprId>,
        /// Capacity bound of a three-index slice.
        max: Option<ExprId>,
        r_brack: Span,
    },
    /// `x.(T)`; `typ` is `None` for `x.(type)` outside a switch guard.
    TypeAssert {
        expr: ExprId,
        typ: Option<TypeId>,
    },
    Call {
        fun: ExprId,
        l_paren: Span,
        args: SmallVec<[ExprId; 4]>,
        /// `...` position when the call spreads its last argument.
        ellipsis: Option<Span>,
    },
    Unary {
        op: UnaryOp,
        op_span: Span,
        expr: ExprId,
    },
    Binary {
        left: ExprId,
        op: BinaryOp,
        op_span: Span,
        right: ExprId,
    },
    /// Pointer dereference `*x` (expression position).
    Star(ExprId),
    /// A type in expression position, e.g. the callee of `[]byte(x)`.
    TypeRef(TypeId),
    /// Unparseable expression; span locates the raw text to recover.
    Bad,
}

/// Literal token: kind plus raw source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicLit {
    pub kind: BasicLitKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicLitKind {
    Int,
    Float,
    Imag,
    Rune,
    String,
}

/// Unary operator. Dereference is [`Expr::Star`], not a `UnaryOp`, because
/// its narration depends on type-versus-expression position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Add,
    Sub,
    Not,
    Xor,
    Addr,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Type node.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// `Name` or `pkg.Name`.
    Named { pkg: Option<Name>, name: Name },
    /// `*T`
    Pointer(TypeId),
    /// `[N]T`; `len` is `None` for `[...]T`.
    Array { len: Option<ExprId>, elem: TypeId },
    /// `[]T`
    Slice(TypeId),
    /// `map[K]V`
    Map { key: TypeId, value: TypeId },
    /// `chan T` / `chan<- T` / `<-chan T`
    Chan { dir: ChanDir, elem: TypeId },
    Struct { fields: FieldList },
    /// Methods and embedded interfaces as a field list; an embedded
    /// interface is an anonymous field.
    Interface { methods: FieldList },
    Func { signature: Signature },
    Paren(TypeId),
    /// Unparseable type; span locates the raw text to recover.
    Bad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}
