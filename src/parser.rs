//! Recursive-descent parser for the narrated Go subset.
//!
//! The parser consumes the full token vector from [`crate::lexer::tokenize`]
//! and never aborts mid-file: anything it cannot make sense of becomes a
//! `Bad` node plus a diagnostic, and parsing resynchronizes at the next
//! statement or declaration boundary. The only fatal condition is a missing
//! `package` clause, which leaves nothing to narrate.

use smallvec::{smallvec, SmallVec};

use crate::ast::*;
use crate::error::{Diag, NarrateError};
use crate::lexer::{tokenize, Token, TokKind};

/// Parses one Go source file.
///
/// Returns the tree plus all lexical and syntactic diagnostics collected on
/// the way. `Err` only when the file has no `package` clause.
pub fn parse_source(src: &str) -> Result<(SourceFile, Vec<Diag>), NarrateError> {
    let (toks, lex_diags) = tokenize(src);
    let mut p = Parser {
        toks,
        pos: 0,
        arena: AstArena::new(),
        diags: lex_diags,
        no_composite: 0,
    };
    p.parse_file()
}

struct Parser {
    toks: Vec<Token>,
    pos: usize,
    arena: AstArena,
    diags: Vec<Diag>,
    /// When nonzero, a `{` directly after an expression is a block, not a
    /// composite literal (if/for/switch headers).
    no_composite: u32,
}

impl Parser {
    // ----- token plumbing -------------------------------------------------

    fn peek(&self) -> &TokKind {
        &self.toks[self.pos].kind
    }

    fn peek_at(&self, n: usize) -> &TokKind {
        let i = (self.pos + n).min(self.toks.len() - 1);
        &self.toks[i].kind
    }

    fn cur_span(&self) -> Span {
        self.toks[self.pos].span
    }

    fn prev_span(&self) -> Span {
        self.toks[self.pos.saturating_sub(1)].span
    }

    fn advance(&mut self) -> Token {
        let tok = self.toks[self.pos].clone();
        if self.pos < self.toks.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: &TokKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokKind, what: &str) -> Span {
        if self.at(kind) {
            self.advance().span
        } else {
            self.error_here(&format!("expected {what}"));
            Span {
                start: self.cur_span().start,
                end: self.cur_span().start,
            }
        }
    }

    fn error_here(&mut self, message: &str) {
        let span = self.cur_span();
        self.diags
            .push(Diag::parse(span.start as usize..span.end as usize, message));
    }

    fn ident(&mut self) -> Option<Name> {
        if let TokKind::Ident(text) = self.peek() {
            let text = text.clone();
            let span = self.advance().span;
            Some(Name { text, span })
        } else {
            None
        }
    }

    fn expect_ident(&mut self, what: &str) -> Name {
        self.ident().unwrap_or_else(|| {
            self.error_here(&format!("expected {what}"));
            Name {
                text: String::new(),
                span: self.cur_span(),
            }
        })
    }

    /// Skips tokens until a likely statement/declaration boundary.
    fn recover_to_boundary(&mut self) {
        loop {
            match self.peek() {
                TokKind::Semi => {
                    self.advance();
                    return;
                }
                TokKind::RBrace
                | TokKind::Eof
                | TokKind::KwFunc
                | TokKind::KwConst
                | TokKind::KwVar
                | TokKind::KwType
                | TokKind::KwCase
                | TokKind::KwDefault => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn without_composite<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.no_composite += 1;
        let out = f(self);
        self.no_composite -= 1;
        out
    }

    fn with_composite<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::take(&mut self.no_composite);
        let out = f(self);
        self.no_composite = saved;
        out
    }

    // ----- file level -----------------------------------------------------

    fn parse_file(&mut self) -> Result<(SourceFile, Vec<Diag>), NarrateError> {
        if !self.eat(&TokKind::KwPackage) {
            self.error_here("expected package clause");
            return Err(NarrateError::ParseFatal {
                diags: std::mem::take(&mut self.diags),
            });
        }
        let package_start = self.prev_span();
        let package_name = self.expect_ident("package name");
        let package_span = package_start.to(package_name.span);
        self.eat(&TokKind::Semi);

        let mut imports = Vec::new();
        while self.at(&TokKind::KwImport) {
            self.advance();
            self.parse_import_decl(&mut imports);
            self.eat(&TokKind::Semi);
        }

        let mut decls = Vec::new();
        while !self.at(&TokKind::Eof) {
            match self.peek() {
                TokKind::KwFunc => {
                    let func = self.parse_func_decl();
                    decls.push(TopLevelDecl::Func(func));
                }
                TokKind::KwConst | TokKind::KwType | TokKind::KwVar => {
                    let id = self.parse_gen_decl();
                    decls.push(TopLevelDecl::Decl(id));
                }
                TokKind::KwImport => {
                    // Imports after other declarations still parse; go/ast
                    // keeps them with the rest.
                    self.advance();
                    self.parse_import_decl(&mut imports);
                }
                TokKind::Semi => {
                    self.advance();
                }
                _ => {
                    let span = self.cur_span();
                    self.error_here("expected declaration");
                    self.recover_to_boundary();
                    let bad = self.arena.alloc_decl(Decl::Bad, span.to(self.prev_span()));
                    decls.push(TopLevelDecl::Decl(bad));
                }
            }
            self.eat(&TokKind::Semi);
        }

        let file = SourceFile {
            package_name,
            package_span,
            imports,
            decls,
            arena: std::mem::take(&mut self.arena),
        };
        Ok((file, std::mem::take(&mut self.diags)))
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) {
        if self.eat(&TokKind::LParen) {
            while !self.at(&TokKind::RParen) && !self.at(&TokKind::Eof) {
                if self.eat(&TokKind::Semi) {
                    continue;
                }
                if let Some(spec) = self.parse_import_spec() {
                    imports.push(spec);
                } else {
                    self.recover_to_boundary();
                }
            }
            self.expect(&TokKind::RParen, "closing parenthesis of import group");
        } else if let Some(spec) = self.parse_import_spec() {
            imports.push(spec);
        } else {
            self.recover_to_boundary();
        }
    }

    fn parse_import_spec(&mut self) -> Option<ImportSpec> {
        let start = self.cur_span();
        let alias = match self.peek() {
            TokKind::Ident(_) => self.ident(),
            TokKind::Dot => {
                let span = self.advance().span;
                Some(Name {
                    text: ".".to_string(),
                    span,
                })
            }
            _ => None,
        };
        let (text, span) = match self.peek() {
            TokKind::Str(s) | TokKind::RawStr(s) => {
                let s = s.clone();
                (s, self.advance().span)
            }
            _ => {
                self.error_here("expected import path");
                return None;
            }
        };
        Some(ImportSpec {
            alias,
            path: BasicLit {
                kind: BasicLitKind::String,
                text,
            },
            span: start.to(span),
        })
    }

    // ----- declarations ---------------------------------------------------

    fn parse_gen_decl(&mut self) -> DeclId {
        let start = self.cur_span();
        let kind = match self.advance().kind {
            TokKind::KwConst => GenDeclKind::Const,
            TokKind::KwType => GenDeclKind::Type,
            _ => GenDeclKind::Var,
        };
        let mut specs = Vec::new();
        if self.eat(&TokKind::LParen) {
            while !self.at(&TokKind::RParen) && !self.at(&TokKind::Eof) {
                if self.eat(&TokKind::Semi) {
                    continue;
                }
                specs.push(self.parse_spec(kind));
            }
            self.expect(&TokKind::RParen, "closing parenthesis of declaration group");
        } else {
            specs.push(self.parse_spec(kind));
        }
        let span = start.to(self.prev_span());
        self.arena.alloc_decl(Decl::Gen(GenDecl { kind, specs }), span)
    }

    fn parse_spec(&mut self, kind: GenDeclKind) -> Spanned<Spec> {
        let start = self.cur_span();
        let node = if kind == GenDeclKind::Type {
            let name = self.expect_ident("type name");
            let alias = self.eat(&TokKind::Assign);
            let typ = self.parse_type();
            Spec::Type(TypeSpec { name, typ, alias })
        } else {
            let mut names: SmallVec<[Name; 2]> = smallvec![self.expect_ident("name")];
            while self.eat(&TokKind::Comma) {
                names.push(self.expect_ident("name"));
            }
            let typ = if self.starts_type() {
                Some(self.parse_type())
            } else {
                None
            };
            let mut values: SmallVec<[ExprId; 2]> = SmallVec::new();
            if self.eat(&TokKind::Assign) {
                values.push(self.parse_expr());
                while self.eat(&TokKind::Comma) {
                    values.push(self.parse_expr());
                }
            }
            Spec::Value(ValueSpec { names, typ, values })
        };
        Spanned {
            node,
            span: start.to(self.prev_span()),
        }
    }

    fn parse_func_decl(&mut self) -> FuncDecl {
        let start = self.expect(&TokKind::KwFunc, "func");
        let recv = if self.at(&TokKind::LParen) {
            Some(self.parse_paren_field_list())
        } else {
            None
        };
        let name = self.expect_ident("function name");
        let signature = self.parse_signature();
        let body = if self.at(&TokKind::LBrace) {
            Some(self.parse_block())
        } else {
            None
        };
        FuncDecl {
            recv,
            name,
            signature,
            body,
            span: start.to(self.prev_span()),
        }
    }

    // ----- signatures and field lists -------------------------------------

    fn parse_signature(&mut self) -> Signature {
        let params = if self.at(&TokKind::LParen) {
            Some(self.parse_paren_field_list())
        } else {
            self.error_here("expected parameter list");
            None
        };
        let results = if self.at(&TokKind::LParen) {
            Some(self.parse_paren_field_list())
        } else if self.starts_type() {
            // Single unnamed result: wrap it so narration counts one value.
            let typ = self.parse_type();
            let span = self.arena.typ(typ).span;
            Some(FieldList {
                fields: vec![Field {
                    names: SmallVec::new(),
                    variadic: false,
                    typ,
                    tag: None,
                }],
                span,
            })
        } else {
            None
        };
        Signature { params, results }
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek(),
            TokKind::Ident(_)
                | TokKind::Star
                | TokKind::LBrack
                | TokKind::KwMap
                | TokKind::KwChan
                | TokKind::KwFunc
                | TokKind::KwStruct
                | TokKind::KwInterface
                | TokKind::Arrow
                | TokKind::LParen
        )
    }

    /// Decides whether a parenthesized field list declares names.
    ///
    /// Go resolves this for the whole list at once: the list is named when
    /// some identifier is directly followed by the start of a type.
    fn paren_list_is_named(&self) -> bool {
        let mut depth = 0usize;
        let mut i = 1; // skip the opening paren
        loop {
            let kind = self.peek_at(i);
            match kind {
                TokKind::LParen | TokKind::LBrack | TokKind::LBrace => depth += 1,
                TokKind::RParen if depth == 0 => return false,
                TokKind::RParen | TokKind::RBrack | TokKind::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                TokKind::Eof => return false,
                TokKind::Ident(_) if depth == 0 => {
                    if matches!(
                        self.peek_at(i + 1),
                        TokKind::Ident(_)
                            | TokKind::Star
                            | TokKind::LBrack
                            | TokKind::Ellipsis
                            | TokKind::Arrow
                            | TokKind::KwMap
                            | TokKind::KwChan
                            | TokKind::KwFunc
                            | TokKind::KwStruct
                            | TokKind::KwInterface
                    ) {
                        return true;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Parameter, result or receiver list in parentheses.
    fn parse_paren_field_list(&mut self) -> FieldList {
        let named = self.paren_list_is_named();
        let start = self.expect(&TokKind::LParen, "opening parenthesis");
        let mut fields = Vec::new();
        while !self.at(&TokKind::RParen) && !self.at(&TokKind::Eof) {
            if named {
                let mut names: SmallVec<[Name; 2]> = smallvec![self.expect_ident("parameter name")];
                while self.at(&TokKind::Comma)
                    && matches!(self.peek_at(1), TokKind::Ident(_))
                    && self.field_names_continue(names.len())
                {
                    self.advance();
                    names.push(self.expect_ident("parameter name"));
                }
                let variadic = self.eat(&TokKind::Ellipsis);
                let typ = self.parse_type();
                fields.push(Field {
                    names,
                    variadic,
                    typ,
                    tag: None,
                });
            } else {
                let variadic = self.eat(&TokKind::Ellipsis);
                let typ = self.parse_type();
                fields.push(Field {
                    names: SmallVec::new(),
                    variadic,
                    typ,
                    tag: None,
                });
            }
            if !self.eat(&TokKind::Comma) {
                break;
            }
        }
        let end = self.expect(&TokKind::RParen, "closing parenthesis");
        FieldList {
            fields,
            span: start.to(end),
        }
    }

    /// After `n` names in a named list, is the next comma still separating
    /// names rather than starting a new field? Names continue while each
    /// comma is followed by `ident ,` or `ident` + type-start never appears
    /// sooner. In practice a lone following ident that is itself followed by
    /// `,` or a type start keeps the run going.
    fn field_names_continue(&self, _taken: usize) -> bool {
        // After `, ident` the run continues unless that ident is followed by
        // `,` ... type or `)` (which would make it a new unnamed entry, a
        // case excluded by `paren_list_is_named`).
        !matches!(self.peek_at(2), TokKind::RParen)
            || !matches!(self.peek_at(1), TokKind::Ident(_))
    }

    /// Struct field list in braces.
    fn parse_struct_fields(&mut self) -> FieldList {
        let start = self.expect(&TokKind::LBrace, "opening brace of struct");
        let mut fields = Vec::new();
        self.with_composite(|p| {
            while !p.at(&TokKind::RBrace) && !p.at(&TokKind::Eof) {
                if p.eat(&TokKind::Semi) {
                    continue;
                }
                let named = matches!(p.peek(), TokKind::Ident(_))
                    && matches!(
                        p.peek_at(1),
                        TokKind::Ident(_)
                            | TokKind::Comma
                            | TokKind::Star
                            | TokKind::LBrack
                            | TokKind::Arrow
                            | TokKind::KwMap
                            | TokKind::KwChan
                            | TokKind::KwFunc
                            | TokKind::KwStruct
                            | TokKind::KwInterface
                    );
                let mut names: SmallVec<[Name; 2]> = SmallVec::new();
                if named {
                    names.push(p.expect_ident("field name"));
                    while p.eat(&TokKind::Comma) {
                        names.push(p.expect_ident("field name"));
                    }
                }
                let typ = p.parse_type();
                let tag = match p.peek() {
                    TokKind::Str(s) | TokKind::RawStr(s) => {
                        let lit = BasicLit {
                            kind: BasicLitKind::String,
                            text: s.clone(),
                        };
                        let span = p.advance().span;
                        Some(p.arena.alloc_expr(Expr::BasicLit(lit), span))
                    }
                    _ => None,
                };
                fields.push(Field {
                    names,
                    variadic: false,
                    typ,
                    tag,
                });
                if !p.eat(&TokKind::Semi) && !p.at(&TokKind::RBrace) {
                    p.error_here("expected end of struct field");
                    p.recover_to_boundary();
                }
            }
        });
        let end = self.expect(&TokKind::RBrace, "closing brace of struct");
        FieldList {
            fields,
            span: start.to(end),
        }
    }

    /// Interface body: methods plus embedded interfaces.
    fn parse_interface_methods(&mut self) -> FieldList {
        let start = self.expect(&TokKind::LBrace, "opening brace of interface");
        let mut fields = Vec::new();
        self.with_composite(|p| {
            while !p.at(&TokKind::RBrace) && !p.at(&TokKind::Eof) {
                if p.eat(&TokKind::Semi) {
                    continue;
                }
                let is_method =
                    matches!(p.peek(), TokKind::Ident(_)) && p.peek_at(1) == &TokKind::LParen;
                if is_method {
                    let name = p.expect_ident("method name");
                    let fn_start = p.cur_span();
                    let signature = p.parse_signature();
                    let typ = p
                        .arena
                        .alloc_type(Type::Func { signature }, fn_start.to(p.prev_span()));
                    fields.push(Field {
                        names: smallvec![name],
                        variadic: false,
                        typ,
                        tag: None,
                    });
                } else {
                    let typ = p.parse_type();
                    fields.push(Field {
                        names: SmallVec::new(),
                        variadic: false,
                        typ,
                        tag: None,
                    });
                }
                if !p.eat(&TokKind::Semi) && !p.at(&TokKind::RBrace) {
                    p.error_here("expected end of interface element");
                    p.recover_to_boundary();
                }
            }
        });
        let end = self.expect(&TokKind::RBrace, "closing brace of interface");
        FieldList {
            fields,
            span: start.to(end),
        }
    }

    // ----- types ----------------------------------------------------------

    fn parse_type(&mut self) -> TypeId {
        let start = self.cur_span();
        match self.peek().clone() {
            TokKind::Ident(_) => {
                let first = self.expect_ident("type name");
                if self.at(&TokKind::Dot) && matches!(self.peek_at(1), TokKind::Ident(_)) {
                    self.advance();
                    let name = self.expect_ident("type name");
                    let span = first.span.to(name.span);
                    self.arena.alloc_type(
                        Type::Named {
                            pkg: Some(first),
                            name,
                        },
                        span,
                    )
                } else {
                    let span = first.span;
                    self.arena.alloc_type(Type::Named { pkg: None, name: first }, span)
                }
            }
            TokKind::Star => {
                self.advance();
                let elem = self.parse_type();
                let span = start.to(self.arena.typ(elem).span);
                self.arena.alloc_type(Type::Pointer(elem), span)
            }
            TokKind::LBrack => {
                self.advance();
                if self.eat(&TokKind::RBrack) {
                    let elem = self.parse_type();
                    let span = start.to(self.arena.typ(elem).span);
                    self.arena.alloc_type(Type::Slice(elem), span)
                } else if self.eat(&TokKind::Ellipsis) {
                    self.expect(&TokKind::RBrack, "closing bracket");
                    let elem = self.parse_type();
                    let span = start.to(self.arena.typ(elem).span);
                    self.arena.alloc_type(Type::Array { len: None, elem }, span)
                } else {
                    let len = self.with_composite(|p| p.parse_expr());
                    self.expect(&TokKind::RBrack, "closing bracket");
                    let elem = self.parse_type();
                    let span = start.to(self.arena.typ(elem).span);
                    self.arena.alloc_type(
                        Type::Array {
                            len: Some(len),
                            elem,
                        },
                        span,
                    )
                }
            }
            TokKind::KwMap => {
                self.advance();
                self.expect(&TokKind::LBrack, "opening bracket of map key");
                let key = self.parse_type();
                self.expect(&TokKind::RBrack, "closing bracket of map key");
                let value = self.parse_type();
                let span = start.to(self.arena.typ(value).span);
                self.arena.alloc_type(Type::Map { key, value }, span)
            }
            TokKind::KwChan => {
                self.advance();
                let dir = if self.eat(&TokKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type();
                let span = start.to(self.arena.typ(elem).span);
                self.arena.alloc_type(Type::Chan { dir, elem }, span)
            }
            TokKind::Arrow => {
                self.advance();
                self.expect(&TokKind::KwChan, "chan after receive arrow");
                let elem = self.parse_type();
                let span = start.to(self.arena.typ(elem).span);
                self.arena.alloc_type(
                    Type::Chan {
                        dir: ChanDir::Recv,
                        elem,
                    },
                    span,
                )
            }
            TokKind::KwFunc => {
                self.advance();
                let signature = self.parse_signature();
                let span = start.to(self.prev_span());
                self.arena.alloc_type(Type::Func { signature }, span)
            }
            TokKind::KwStruct => {
                self.advance();
                let fields = self.parse_struct_fields();
                let span = start.to(self.prev_span());
                self.arena.alloc_type(Type::Struct { fields }, span)
            }
            TokKind::KwInterface => {
                self.advance();
                let methods = self.parse_interface_methods();
                let span = start.to(self.prev_span());
                self.arena.alloc_type(Type::Interface { methods }, span)
            }
            TokKind::LParen => {
                self.advance();
                let inner = self.parse_type();
                let end = self.expect(&TokKind::RParen, "closing parenthesis");
                self.arena.alloc_type(Type::Paren(inner), start.to(end))
            }
            _ => {
                self.error_here("expected type");
                let span = self.cur_span();
                self.advance();
                self.arena.alloc_type(Type::Bad, span)
            }
        }
    }

    // ----- expressions ----------------------------------------------------

    fn parse_expr(&mut self) -> ExprId {
        self.parse_binary(1)
    }

    fn parse_expr_list(&mut self) -> SmallVec<[ExprId; 2]> {
        let mut list: SmallVec<[ExprId; 2]> = smallvec![self.parse_expr()];
        while self.eat(&TokKind::Comma) {
            list.push(self.parse_expr());
        }
        list
    }

    fn parse_binary(&mut self, min_prec: u8) -> ExprId {
        let mut left = self.parse_unary();
        while let Some((op, prec)) = binary_op(self.peek()) {
            if prec < min_prec {
                break;
            }
            let op_span = self.advance().span;
            let right = self.parse_binary(prec + 1);
            let span = self.arena.expr(left).span.to(self.arena.expr(right).span);
            left = self.arena.alloc_expr(
                Expr::Binary {
                    left,
                    op,
                    op_span,
                    right,
                },
                span,
            );
        }
        left
    }

    fn parse_unary(&mut self) -> ExprId {
        let start = self.cur_span();
        let op = match self.peek() {
            TokKind::Plus => Some(UnaryOp::Add),
            TokKind::Minus => Some(UnaryOp::Sub),
            TokKind::Bang => Some(UnaryOp::Not),
            TokKind::Caret => Some(UnaryOp::Xor),
            TokKind::Amp => Some(UnaryOp::Addr),
            TokKind::Arrow if self.peek_at(1) != &TokKind::KwChan => Some(UnaryOp::Recv),
            _ => None,
        };
        if let Some(op) = op {
            let op_span = self.advance().span;
            let expr = self.parse_unary();
            let span = start.to(self.arena.expr(expr).span);
            return self
                .arena
                .alloc_expr(Expr::Unary { op, op_span, expr }, span);
        }
        if self.at(&TokKind::Star) {
            self.advance();
            let expr = self.parse_unary();
            let span = start.to(self.arena.expr(expr).span);
            return self.arena.alloc_expr(Expr::Star(expr), span);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ExprId {
        let mut expr = self.parse_operand();
        loop {
            match self.peek() {
                TokKind::Dot => {
                    expr = self.parse_selector_or_assert(expr);
                }
                TokKind::LParen => {
                    expr = self.parse_call(expr);
                }
                TokKind::LBrack => {
                    expr = self.parse_index_or_slice(expr);
                }
                TokKind::LBrace if self.composite_allowed(expr) => {
                    let typ = self.expr_as_type(expr);
                    expr = self.parse_composite_lit(typ);
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_operand(&mut self) -> ExprId {
        let start = self.cur_span();
        match self.peek().clone() {
            TokKind::Ident(text) => {
                let span = self.advance().span;
                self.arena.alloc_expr(Expr::Ident(text), span)
            }
            TokKind::Int(text) => self.lit(BasicLitKind::Int, text),
            TokKind::Float(text) => self.lit(BasicLitKind::Float, text),
            TokKind::Imag(text) => self.lit(BasicLitKind::Imag, text),
            TokKind::Rune(text) => self.lit(BasicLitKind::Rune, text),
            TokKind::Str(text) | TokKind::RawStr(text) => self.lit(BasicLitKind::String, text),
            TokKind::LParen => {
                let l_paren = self.advance().span;
                let inner = self.with_composite(|p| p.parse_expr());
                let r_paren = self.expect(&TokKind::RParen, "closing parenthesis");
                self.arena.alloc_expr(
                    Expr::Paren {
                        l_paren,
                        expr: inner,
                        r_paren,
                    },
                    l_paren.to(r_paren),
                )
            }
            TokKind::KwFunc => {
                self.advance();
                let signature = self.parse_signature();
                if self.at(&TokKind::LBrace) {
                    let body = self.with_composite(|p| p.parse_block());
                    let span = start.to(self.prev_span());
                    self.arena.alloc_expr(Expr::FuncLit { signature, body }, span)
                } else {
                    let span = start.to(self.prev_span());
                    let typ = self.arena.alloc_type(Type::Func { signature }, span);
                    self.arena.alloc_expr(Expr::TypeRef(typ), span)
                }
            }
            TokKind::LBrack
            | TokKind::KwMap
            | TokKind::KwChan
            | TokKind::KwStruct
            | TokKind::KwInterface
            | TokKind::Arrow => {
                // Composite types in expression position: conversions like
                // []byte(s) and literals like map[string]int{...}.
                let typ = self.parse_type();
                let span = self.arena.typ(typ).span;
                self.arena.alloc_expr(Expr::TypeRef(typ), span)
            }
            _ => {
                self.error_here("expected expression");
                let span = self.cur_span();
                self.advance();
                self.arena.alloc_expr(Expr::Bad, span)
            }
        }
    }

    fn lit(&mut self, kind: BasicLitKind, text: String) -> ExprId {
        let span = self.advance().span;
        self.arena
            .alloc_expr(Expr::BasicLit(BasicLit { kind, text }), span)
    }

    fn parse_selector_or_assert(&mut self, expr: ExprId) -> ExprId {
        self.advance(); // dot
        if self.eat(&TokKind::LParen) {
            let typ = if self.eat(&TokKind::KwType) {
                None
            } else {
                Some(self.parse_type())
            };
            let end = self.expect(&TokKind::RParen, "closing parenthesis of type assertion");
            let span = self.arena.expr(expr).span.to(end);
            self.arena.alloc_expr(Expr::TypeAssert { expr, typ }, span)
        } else {
            let sel = self.expect_ident("selector");
            let span = self.arena.expr(expr).span.to(sel.span);
            self.arena.alloc_expr(Expr::Selector { expr, sel }, span)
        }
    }

    fn parse_call(&mut self, fun: ExprId) -> ExprId {
        let l_paren = self.advance().span;
        let mut args: SmallVec<[ExprId; 4]> = SmallVec::new();
        let mut ellipsis = None;
        self.with_composite(|p| {
            while !p.at(&TokKind::RParen) && !p.at(&TokKind::Eof) {
                args.push(p.parse_expr());
                if p.at(&TokKind::Ellipsis) {
                    ellipsis = Some(p.advance().span);
                }
                if !p.eat(&TokKind::Comma) {
                    break;
                }
            }
        });
        let end = self.expect(&TokKind::RParen, "closing parenthesis of call");
        let span = self.arena.expr(fun).span.to(end);
        self.arena.alloc_expr(
            Expr::Call {
                fun,
                l_paren,
                args,
                ellipsis,
            },
            span,
        )
    }

    fn parse_index_or_slice(&mut self, expr: ExprId) -> ExprId {
        let l_brack = self.advance().span;
        self.with_composite(|p| {
            let low = if p.at(&TokKind::Colon) {
                None
            } else {
                Some(p.parse_expr())
            };
            if p.eat(&TokKind::Colon) {
                let high = if p.at(&TokKind::Colon) || p.at(&TokKind::RBrack) {
                    None
                } else {
                    Some(p.parse_expr())
                };
                let max = if p.eat(&TokKind::Colon) {
                    Some(p.parse_expr())
                } else {
                    None
                };
                let r_brack = p.expect(&TokKind::RBrack, "closing bracket of slice");
                let span = p.arena.expr(expr).span.to(r_brack);
                p.arena.alloc_expr(
                    Expr::Slice {
                        expr,
                        l_brack,
                        low,
                        high,
                        max,
                        r_brack,
                    },
                    span,
                )
            } else {
                let index = low.unwrap_or_else(|| {
                    p.error_here("expected index expression");
                    p.arena.alloc_expr(Expr::Bad, l_brack)
                });
                let r_brack = p.expect(&TokKind::RBrack, "closing bracket of index");
                let span = p.arena.expr(expr).span.to(r_brack);
                p.arena.alloc_expr(
                    Expr::Index {
                        expr,
                        l_brack,
                        index,
                    },
                    span,
                )
            }
        })
    }

    /// A `{` after this expression opens a composite literal only when
    /// composites are allowed here and the expression can name a type.
    fn composite_allowed(&self, expr: ExprId) -> bool {
        if self.no_composite > 0 {
            // Inside an if/for/switch header a brace is the body, except
            // after an explicit composite type like []int or map[k]v.
            return matches!(self.arena.expr(expr).node, Expr::TypeRef(_));
        }
        matches!(
            self.arena.expr(expr).node,
            Expr::Ident(_) | Expr::Selector { .. } | Expr::TypeRef(_) | Expr::Index { .. }
        )
    }

    /// Reinterprets an expression as the type of a composite literal.
    fn expr_as_type(&mut self, expr: ExprId) -> Option<TypeId> {
        let spanned = self.arena.expr(expr).clone();
        match spanned.node {
            Expr::Ident(text) => Some(self.arena.alloc_type(
                Type::Named {
                    pkg: None,
                    name: Name {
                        text,
                        span: spanned.span,
                    },
                },
                spanned.span,
            )),
            Expr::Selector { expr: base, sel } => {
                if let Expr::Ident(pkg) = &self.arena.expr(base).node {
                    let pkg = Name {
                        text: pkg.clone(),
                        span: self.arena.expr(base).span,
                    };
                    Some(self.arena.alloc_type(
                        Type::Named {
                            pkg: Some(pkg),
                            name: sel,
                        },
                        spanned.span,
                    ))
                } else {
                    Some(self.arena.alloc_type(Type::Bad, spanned.span))
                }
            }
            Expr::TypeRef(typ) => Some(typ),
            _ => Some(self.arena.alloc_type(Type::Bad, spanned.span)),
        }
    }

    fn parse_composite_lit(&mut self, typ: Option<TypeId>) -> ExprId {
        let l_brace = self.expect(&TokKind::LBrace, "opening brace of composite literal");
        let mut elements = Vec::new();
        self.with_composite(|p| {
            while !p.at(&TokKind::RBrace) && !p.at(&TokKind::Eof) {
                elements.push(p.parse_composite_element());
                if !p.eat(&TokKind::Comma) {
                    break;
                }
            }
        });
        let end = self.expect(&TokKind::RBrace, "closing brace of composite literal");
        let start = typ
            .map(|t| self.arena.typ(t).span)
            .unwrap_or(l_brace);
        self.arena.alloc_expr(
            Expr::CompositeLit {
                typ,
                l_brace,
                elements,
            },
            start.to(end),
        )
    }

    fn parse_composite_element(&mut self) -> ExprId {
        let first = if self.at(&TokKind::LBrace) {
            self.parse_composite_lit(None)
        } else {
            self.parse_expr()
        };
        if self.eat(&TokKind::Colon) {
            let value = if self.at(&TokKind::LBrace) {
                self.parse_composite_lit(None)
            } else {
                self.parse_expr()
            };
            let span = self.arena.expr(first).span.to(self.arena.expr(value).span);
            self.arena
                .alloc_expr(Expr::KeyValue { key: first, value }, span)
        } else {
            first
        }
    }

    // ----- statements -----------------------------------------------------

    fn parse_block(&mut self) -> Block {
        let start = self.expect(&TokKind::LBrace, "opening brace");
        let mut stmts = Vec::new();
        self.with_composite(|p| {
            while !p.at(&TokKind::RBrace) && !p.at(&TokKind::Eof) {
                if p.eat(&TokKind::Semi) {
                    continue;
                }
                stmts.push(p.parse_stmt());
                if !p.eat(&TokKind::Semi)
                    && !p.at(&TokKind::RBrace)
                    && !p.at(&TokKind::Eof)
                {
                    p.error_here("expected end of statement");
                    p.recover_to_boundary();
                }
            }
        });
        let end = self.expect(&TokKind::RBrace, "closing brace");
        Block {
            stmts,
            span: start.to(end),
        }
    }

    fn parse_stmt(&mut self) -> StmtId {
        let start = self.cur_span();
        match self.peek() {
            TokKind::KwConst | TokKind::KwVar | TokKind::KwType => {
                let decl = self.parse_gen_decl();
                let span = self.arena.decl(decl).span;
                self.arena.alloc_stmt(Stmt::Decl(decl), span)
            }
            TokKind::LBrace => {
                let block = self.parse_block();
                let span = block.span;
                self.arena.alloc_stmt(Stmt::Block(block), span)
            }
            TokKind::KwIf => self.parse_if_stmt(),
            TokKind::KwFor => self.parse_for_stmt(),
            TokKind::KwSwitch => self.parse_switch_stmt(),
            TokKind::KwSelect => self.parse_select_stmt(),
            TokKind::KwGo => {
                self.advance();
                let call = self.parse_expr();
                let span = start.to(self.arena.expr(call).span);
                self.arena.alloc_stmt(Stmt::Go(call), span)
            }
            TokKind::KwDefer => {
                self.advance();
                let call = self.parse_expr();
                let span = start.to(self.arena.expr(call).span);
                self.arena.alloc_stmt(Stmt::Defer(call), span)
            }
            TokKind::KwReturn => {
                self.advance();
                let values = if self.stmt_ends() {
                    SmallVec::new()
                } else {
                    self.parse_expr_list()
                };
                let span = start.to(self.prev_span());
                self.arena.alloc_stmt(Stmt::Return(values), span)
            }
            TokKind::KwBreak | TokKind::KwContinue | TokKind::KwGoto | TokKind::KwFallthrough => {
                let kind = match self.advance().kind {
                    TokKind::KwBreak => BranchKind::Break,
                    TokKind::KwContinue => BranchKind::Continue,
                    TokKind::KwGoto => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                let label = self.ident();
                let span = start.to(self.prev_span());
                self.arena.alloc_stmt(Stmt::Branch { kind, label }, span)
            }
            TokKind::Ident(_) if self.peek_at(1) == &TokKind::Colon => {
                let label = self.expect_ident("label");
                self.advance(); // colon
                let stmt = if self.stmt_ends() {
                    self.arena.alloc_stmt(Stmt::Empty, self.cur_span())
                } else {
                    self.parse_stmt()
                };
                let span = start.to(self.arena.stmt(stmt).span);
                self.arena.alloc_stmt(Stmt::Labeled { label, stmt }, span)
            }
            TokKind::Semi => self.arena.alloc_stmt(Stmt::Empty, start),
            _ => match self.parse_simple_stmt(false) {
                Simple::Stmt(id) => id,
                Simple::Range(_) => unreachable!("range outside for header"),
            },
        }
    }

    fn stmt_ends(&self) -> bool {
        matches!(
            self.peek(),
            TokKind::Semi | TokKind::RBrace | TokKind::Eof | TokKind::KwCase | TokKind::KwDefault
        )
    }

    fn parse_simple_stmt(&mut self, allow_range: bool) -> Simple {
        let start = self.cur_span();
        if allow_range && self.eat(&TokKind::KwRange) {
            let expr = self.parse_expr();
            return Simple::Range(ForKind::Range {
                key: None,
                value: None,
                define: false,
                expr,
            });
        }
        let lhs = self.parse_expr_list();
        let op = match self.peek() {
            TokKind::Define => Some(AssignOp::Define),
            TokKind::Assign => Some(AssignOp::Assign),
            TokKind::AddAssign => Some(AssignOp::Add),
            TokKind::SubAssign => Some(AssignOp::Sub),
            TokKind::MulAssign => Some(AssignOp::Mul),
            TokKind::DivAssign => Some(AssignOp::Div),
            TokKind::ModAssign => Some(AssignOp::Mod),
            TokKind::AndAssign => Some(AssignOp::And),
            TokKind::OrAssign => Some(AssignOp::Or),
            TokKind::XorAssign => Some(AssignOp::Xor),
            TokKind::ShlAssign => Some(AssignOp::Shl),
            TokKind::ShrAssign => Some(AssignOp::Shr),
            TokKind::AndNotAssign => Some(AssignOp::AndNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            if allow_range
                && matches!(op, AssignOp::Define | AssignOp::Assign)
                && self.eat(&TokKind::KwRange)
            {
                let expr = self.parse_expr();
                let mut it = lhs.into_iter();
                return Simple::Range(ForKind::Range {
                    key: it.next(),
                    value: it.next(),
                    define: op == AssignOp::Define,
                    expr,
                });
            }
            let rhs = self.parse_expr_list();
            let span = start.to(self.prev_span());
            return Simple::Stmt(self.arena.alloc_stmt(Stmt::Assign { lhs, op, rhs }, span));
        }
        match self.peek() {
            TokKind::Arrow => {
                self.advance();
                let value = self.parse_expr();
                let chan = lhs[0];
                let span = start.to(self.arena.expr(value).span);
                Simple::Stmt(self.arena.alloc_stmt(Stmt::Send { chan, value }, span))
            }
            TokKind::Inc | TokKind::Dec => {
                let op = if self.advance().kind == TokKind::Inc {
                    IncDecOp::Inc
                } else {
                    IncDecOp::Dec
                };
                let span = start.to(self.prev_span());
                Simple::Stmt(self.arena.alloc_stmt(Stmt::IncDec { expr: lhs[0], op }, span))
            }
            _ => {
                if lhs.len() > 1 {
                    self.error_here("expected assignment after expression list");
                }
                let expr = lhs[0];
                let span = self.arena.expr(expr).span;
                Simple::Stmt(self.arena.alloc_stmt(Stmt::Expr(expr), span))
            }
        }
    }

    fn parse_if_stmt(&mut self) -> StmtId {
        let start = self.expect(&TokKind::KwIf, "if");
        let (init, cond) = self.without_composite(|p| {
            let first = match p.parse_simple_stmt(false) {
                Simple::Stmt(id) => id,
                Simple::Range(_) => unreachable!(),
            };
            if p.eat(&TokKind::Semi) {
                let cond = p.parse_expr();
                (Some(first), cond)
            } else {
                let node = p.arena.stmt(first).node.clone();
                let cond = if let Stmt::Expr(e) = node {
                    e
                } else {
                    p.error_here("expected condition");
                    let span = p.cur_span();
                    p.arena.alloc_expr(Expr::Bad, span)
                };
                (None, cond)
            }
        });
        let then_block = self.parse_block();
        let else_stmt = if self.eat(&TokKind::KwElse) {
            if self.at(&TokKind::KwIf) {
                Some(self.parse_if_stmt())
            } else {
                let block = self.parse_block();
                let span = block.span;
                Some(self.arena.alloc_stmt(Stmt::Block(block), span))
            }
        } else {
            None
        };
        let span = start.to(self.prev_span());
        self.arena.alloc_stmt(
            Stmt::If(IfStmt {
                init,
                cond,
                then_block,
                else_stmt,
            }),
            span,
        )
    }

    fn parse_for_stmt(&mut self) -> StmtId {
        let start = self.expect(&TokKind::KwFor, "for");
        let kind = self.without_composite(|p| {
            if p.at(&TokKind::LBrace) {
                return ForKind::Infinite;
            }
            if p.at(&TokKind::Semi) {
                // for ; cond ; post
                p.advance();
                return p.parse_for_clause(None);
            }
            match p.parse_simple_stmt(true) {
                Simple::Range(kind) => kind,
                Simple::Stmt(first) => {
                    if p.eat(&TokKind::Semi) {
                        p.parse_for_clause(Some(first))
                    } else {
                        let node = p.arena.stmt(first).node.clone();
                        if let Stmt::Expr(e) = node {
                            ForKind::Cond(e)
                        } else {
                            p.error_here("expected loop condition");
                            ForKind::Clause {
                                init: Some(first),
                                cond: None,
                                post: None,
                            }
                        }
                    }
                }
            }
        });
        let block = self.parse_block();
        let span = start.to(self.prev_span());
        self.arena.alloc_stmt(Stmt::For(ForStmt { kind, block }), span)
    }

    /// Remainder of a three-part for clause, after the first semicolon.
    fn parse_for_clause(&mut self, init: Option<StmtId>) -> ForKind {
        let cond = if self.at(&TokKind::Semi) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&TokKind::Semi, "semicolon in for clause");
        let post = if self.at(&TokKind::LBrace) {
            None
        } else {
            match self.parse_simple_stmt(false) {
                Simple::Stmt(id) => Some(id),
                Simple::Range(_) => None,
            }
        };
        // A clause with neither init nor post is the same loop as its
        // bare spelling, and narrates the same way.
        match (init, cond, post) {
            (None, Some(cond), None) => ForKind::Cond(cond),
            (None, None, None) => ForKind::Infinite,
            (init, cond, post) => ForKind::Clause { init, cond, post },
        }
    }

    fn parse_switch_stmt(&mut self) -> StmtId {
        let start = self.expect(&TokKind::KwSwitch, "switch");
        let (init, guard) = self.without_composite(|p| {
            if p.at(&TokKind::LBrace) {
                return (None, None);
            }
            let first = match p.parse_simple_stmt(false) {
                Simple::Stmt(id) => id,
                Simple::Range(_) => unreachable!(),
            };
            if p.eat(&TokKind::Semi) {
                if p.at(&TokKind::LBrace) {
                    (Some(first), None)
                } else {
                    let second = match p.parse_simple_stmt(false) {
                        Simple::Stmt(id) => id,
                        Simple::Range(_) => unreachable!(),
                    };
                    (Some(first), Some(second))
                }
            } else {
                (None, Some(first))
            }
        });

        // A guard of the form `v := x.(type)` or `x.(type)` makes this a
        // type switch.
        if let Some(guard_id) = guard {
            if let Some((bind, expr)) = self.type_switch_guard(guard_id) {
                let (clauses, body_span) = self.parse_switch_body(true);
                let span = start.to(self.prev_span());
                return self.arena.alloc_stmt(
                    Stmt::TypeSwitch(TypeSwitchStmt {
                        init,
                        bind,
                        expr,
                        clauses,
                        body_span,
                    }),
                    span,
                );
            }
        }

        let tag = match guard {
            Some(id) => {
                let spanned = self.arena.stmt(id).clone();
                if let Stmt::Expr(e) = spanned.node {
                    Some(e)
                } else {
                    self.diags.push(Diag::parse(
                        spanned.span.start as usize..spanned.span.end as usize,
                        "expected switch expression",
                    ));
                    None
                }
            }
            None => None,
        };
        let (clauses, body_span) = self.parse_switch_body(false);
        let span = start.to(self.prev_span());
        self.arena.alloc_stmt(
            Stmt::Switch(SwitchStmt {
                init,
                tag,
                clauses,
                body_span,
            }),
            span,
        )
    }

    /// Extracts the binding and operand of a type-switch guard, if the
    /// statement has that shape.
    fn type_switch_guard(&self, guard: StmtId) -> Option<(Option<Name>, ExprId)> {
        match &self.arena.stmt(guard).node {
            Stmt::Expr(e) => match self.arena.expr(*e).node {
                Expr::TypeAssert { expr, typ: None } => Some((None, expr)),
                _ => None,
            },
            Stmt::Assign { lhs, op: AssignOp::Define, rhs } if lhs.len() == 1 && rhs.len() == 1 => {
                let bind = match &self.arena.expr(lhs[0]).node {
                    Expr::Ident(text) => Name {
                        text: text.clone(),
                        span: self.arena.expr(lhs[0]).span,
                    },
                    _ => return None,
                };
                match self.arena.expr(rhs[0]).node {
                    Expr::TypeAssert { expr, typ: None } => Some((Some(bind), expr)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn parse_switch_body(&mut self, type_switch: bool) -> (Vec<Spanned<SwitchClause>>, Span) {
        let start = self.expect(&TokKind::LBrace, "opening brace of switch");
        let mut clauses = Vec::new();
        self.with_composite(|p| {
            while !p.at(&TokKind::RBrace) && !p.at(&TokKind::Eof) {
                let clause_start = p.cur_span();
                let node = if p.eat(&TokKind::KwCase) {
                    if type_switch {
                        let mut types: SmallVec<[TypeId; 2]> = smallvec![p.parse_type()];
                        while p.eat(&TokKind::Comma) {
                            types.push(p.parse_type());
                        }
                        p.expect(&TokKind::Colon, "colon after case");
                        let stmts = p.parse_clause_stmts();
                        SwitchClause::Type { types, stmts }
                    } else {
                        let exprs = p.parse_expr_list();
                        p.expect(&TokKind::Colon, "colon after case");
                        let stmts = p.parse_clause_stmts();
                        SwitchClause::Expr { exprs, stmts }
                    }
                } else if p.eat(&TokKind::KwDefault) {
                    p.expect(&TokKind::Colon, "colon after default");
                    let stmts = p.parse_clause_stmts();
                    SwitchClause::Default { stmts }
                } else {
                    p.error_here("expected case or default");
                    p.recover_to_boundary();
                    continue;
                };
                clauses.push(Spanned {
                    node,
                    span: clause_start.to(p.prev_span()),
                });
            }
        });
        let end = self.expect(&TokKind::RBrace, "closing brace of switch");
        (clauses, start.to(end))
    }

    fn parse_clause_stmts(&mut self) -> Vec<StmtId> {
        let mut stmts = Vec::new();
        while !matches!(
            self.peek(),
            TokKind::KwCase | TokKind::KwDefault | TokKind::RBrace | TokKind::Eof
        ) {
            if self.eat(&TokKind::Semi) {
                continue;
            }
            stmts.push(self.parse_stmt());
            if !self.eat(&TokKind::Semi) && !self.stmt_ends() {
                self.error_here("expected end of statement");
                self.recover_to_boundary();
            }
        }
        stmts
    }

    fn parse_select_stmt(&mut self) -> StmtId {
        let start = self.expect(&TokKind::KwSelect, "select");
        let body_start = self.expect(&TokKind::LBrace, "opening brace of select");
        let mut clauses = Vec::new();
        self.with_composite(|p| {
            while !p.at(&TokKind::RBrace) && !p.at(&TokKind::Eof) {
                let clause_start = p.cur_span();
                let node = if p.eat(&TokKind::KwCase) {
                    let stmt = match p.parse_simple_stmt(false) {
                        Simple::Stmt(id) => id,
                        Simple::Range(_) => unreachable!(),
                    };
                    p.expect(&TokKind::Colon, "colon after case");
                    let comm = p.comm_stmt(stmt);
                    let stmts = p.parse_clause_stmts();
                    CommClause::Comm { comm, stmts }
                } else if p.eat(&TokKind::KwDefault) {
                    p.expect(&TokKind::Colon, "colon after default");
                    let stmts = p.parse_clause_stmts();
                    CommClause::Default { stmts }
                } else {
                    p.error_here("expected case or default");
                    p.recover_to_boundary();
                    continue;
                };
                clauses.push(Spanned {
                    node,
                    span: clause_start.to(p.prev_span()),
                });
            }
        });
        let body_end = self.expect(&TokKind::RBrace, "closing brace of select");
        let span = start.to(body_end);
        self.arena.alloc_stmt(
            Stmt::Select(SelectStmt {
                clauses,
                body_span: body_start.to(body_end),
            }),
            span,
        )
    }

    /// Reinterprets the parsed case statement as a communication.
    fn comm_stmt(&mut self, stmt: StmtId) -> CommStmt {
        match self.arena.stmt(stmt).node.clone() {
            Stmt::Send { chan, value } => CommStmt::Send { chan, value },
            Stmt::Assign { lhs, op, rhs } if rhs.len() == 1 => CommStmt::Recv {
                lhs,
                define: op == AssignOp::Define,
                expr: rhs[0],
            },
            Stmt::Expr(expr) => CommStmt::Recv {
                lhs: SmallVec::new(),
                define: false,
                expr,
            },
            _ => {
                let span = self.arena.stmt(stmt).span;
                self.diags.push(Diag::parse(
                    span.start as usize..span.end as usize,
                    "expected send or receive in select case",
                ));
                let bad = self.arena.alloc_expr(Expr::Bad, span);
                CommStmt::Recv {
                    lhs: SmallVec::new(),
                    define: false,
                    expr: bad,
                }
            }
        }
    }
}

enum Simple {
    Stmt(StmtId),
    Range(ForKind),
}

fn binary_op(kind: &TokKind) -> Option<(BinaryOp, u8)> {
    let (op, prec) = match kind {
        TokKind::LOr => (BinaryOp::LOr, 1),
        TokKind::LAnd => (BinaryOp::LAnd, 2),
        TokKind::EqEq => (BinaryOp::Eq, 3),
        TokKind::NotEq => (BinaryOp::Ne, 3),
        TokKind::Lt => (BinaryOp::Lt, 3),
        TokKind::Le => (BinaryOp::Le, 3),
        TokKind::Gt => (BinaryOp::Gt, 3),
        TokKind::Ge => (BinaryOp::Ge, 3),
        TokKind::Plus => (BinaryOp::Add, 4),
        TokKind::Minus => (BinaryOp::Sub, 4),
        TokKind::Pipe => (BinaryOp::Or, 4),
        TokKind::Caret => (BinaryOp::Xor, 4),
        TokKind::Star => (BinaryOp::Mul, 5),
        TokKind::Slash => (BinaryOp::Div, 5),
        TokKind::Percent => (BinaryOp::Mod, 5),
        TokKind::Shl => (BinaryOp::Shl, 5),
        TokKind::Shr => (BinaryOp::Shr, 5),
        TokKind::Amp => (BinaryOp::And, 5),
        TokKind::AndNot => (BinaryOp::AndNot, 5),
        _ => return None,
    };
    Some((op, prec))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> SourceFile {
        let (file, diags) = parse_source(src).expect("parse");
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        file
    }

    #[test]
    fn parses_minimal_file() {
        let file = parse_ok("package main\n\nfunc main() {\n}\n");
        assert_eq!(file.package_name.text, "main");
        assert_eq!(file.decls.len(), 1);
        match &file.decls[0] {
            TopLevelDecl::Func(f) => {
                assert_eq!(f.name.text, "main");
                assert!(f.recv.is_none());
                assert!(f.body.is_some());
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn parses_imports() {
        let file = parse_ok("package p\n\nimport (\n\t\"fmt\"\n\tstr \"strings\"\n)\n");
        assert_eq!(file.imports.len(), 2);
        assert_eq!(file.imports[0].path.text, "\"fmt\"");
        assert!(file.imports[0].alias.is_none());
        assert_eq!(file.imports[1].alias.as_ref().unwrap().text, "str");
    }

    #[test]
    fn parses_named_parameter_list() {
        let file = parse_ok("package p\nfunc add(a, b int) int { return a + b }\n");
        let TopLevelDecl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let params = f.signature.params.as_ref().unwrap();
        assert_eq!(params.num_fields(), 2);
        assert_eq!(params.fields[0].names[0].text, "a");
        let results = f.signature.results.as_ref().unwrap();
        assert_eq!(results.num_fields(), 1);
    }

    #[test]
    fn parses_unnamed_parameter_list() {
        let file = parse_ok("package p\nfunc f(int, string) {}\n");
        let TopLevelDecl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let params = f.signature.params.as_ref().unwrap();
        assert_eq!(params.num_fields(), 2);
        assert!(params.fields.iter().all(|fl| fl.names.is_empty()));
    }

    #[test]
    fn parses_method_with_receiver() {
        let file = parse_ok("package p\nfunc (s *Server) Run() error { return nil }\n");
        let TopLevelDecl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        assert!(f.recv.is_some());
        assert_eq!(f.name.text, "Run");
    }

    #[test]
    fn if_header_brace_is_block_not_composite() {
        let file = parse_ok("package p\nfunc f(x int) {\n\tif x > 1 {\n\t\tx--\n\t}\n}\n");
        let TopLevelDecl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let body = f.body.as_ref().unwrap();
        assert_eq!(body.stmts.len(), 1);
        assert!(matches!(file.arena.stmt(body.stmts[0]).node, Stmt::If(_)));
    }

    #[test]
    fn parses_for_range() {
        let file = parse_ok("package p\nfunc f(xs []int) {\n\tfor i, x := range xs {\n\t\t_ = i\n\t\t_ = x\n\t}\n}\n");
        let TopLevelDecl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let body = f.body.as_ref().unwrap();
        let Stmt::For(ForStmt { kind, .. }) = &file.arena.stmt(body.stmts[0]).node else {
            panic!("expected for");
        };
        assert!(matches!(
            kind,
            ForKind::Range {
                key: Some(_),
                value: Some(_),
                define: true,
                ..
            }
        ));
    }

    #[test]
    fn parses_type_switch() {
        let file = parse_ok(
            "package p\nfunc f(x interface{}) {\n\tswitch v := x.(type) {\n\tcase int:\n\t\t_ = v\n\tdefault:\n\t}\n}\n",
        );
        let TopLevelDecl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let body = f.body.as_ref().unwrap();
        let Stmt::TypeSwitch(ts) = &file.arena.stmt(body.stmts[0]).node else {
            panic!("expected type switch");
        };
        assert_eq!(ts.bind.as_ref().unwrap().text, "v");
        assert_eq!(ts.clauses.len(), 2);
    }

    #[test]
    fn parses_select() {
        let file = parse_ok(
            "package p\nfunc f(ch chan int) {\n\tselect {\n\tcase v := <-ch:\n\t\t_ = v\n\tcase ch <- 1:\n\tdefault:\n\t}\n}\n",
        );
        let TopLevelDecl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let body = f.body.as_ref().unwrap();
        let Stmt::Select(sel) = &file.arena.stmt(body.stmts[0]).node else {
            panic!("expected select");
        };
        assert_eq!(sel.clauses.len(), 3);
        assert!(matches!(
            sel.clauses[0].node,
            CommClause::Comm {
                comm: CommStmt::Recv { define: true, .. },
                ..
            }
        ));
        assert!(matches!(
            sel.clauses[1].node,
            CommClause::Comm {
                comm: CommStmt::Send { .. },
                ..
            }
        ));
    }

    #[test]
    fn parses_composite_and_call() {
        let file = parse_ok("package p\nvar x = map[string]int{\"a\": 1}\nvar y = f(1, 2)\n");
        assert_eq!(file.decls.len(), 2);
    }

    #[test]
    fn missing_package_clause_is_fatal() {
        let err = parse_source("func main() {}\n").unwrap_err();
        assert!(matches!(err, NarrateError::ParseFatal { .. }));
    }

    #[test]
    fn bad_declaration_recovers() {
        let (file, diags) = parse_source("package p\n@@@\nfunc f() {}\n").expect("parse");
        assert!(!diags.is_empty());
        assert!(file
            .decls
            .iter()
            .any(|d| matches!(d, TopLevelDecl::Func(_))));
    }

    #[test]
    fn variadic_call_records_ellipsis() {
        let file = parse_ok("package p\nfunc f(xs ...int) { f(xs...) }\n");
        let TopLevelDecl::Func(f) = &file.decls[0] else {
            panic!("expected function");
        };
        let body = f.body.as_ref().unwrap();
        let Stmt::Expr(call) = file.arena.stmt(body.stmts[0]).node else {
            panic!("expected expression statement");
        };
        let Expr::Call { ellipsis, .. } = &file.arena.expr(call).node else {
            panic!("expected call");
        };
        assert!(ellipsis.is_some());
    }
}
