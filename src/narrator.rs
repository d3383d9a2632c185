//! The narration engine and its public surface.
//!
//! [`Engine`] walks the syntax tree depth-first and pushes one English phrase
//! per spoken token into a [`SpeechBuffer`], consulting the [`RangeFilter`]
//! before every phrase so a narration window can cut through the middle of a
//! construct. [`Narrator`] wraps the engine with source loading, window
//! validation and the speech backend.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::ast::*;
use crate::backend;
use crate::error::NarrateError;
use crate::parser::parse_source;
use crate::phonetic::{string_speech, transcribe};
use crate::source::SourceMap;
use crate::speech::SpeechBuffer;
use crate::window::{RangeFilter, Window};

fn binary_word(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::LOr => "or",
        BinaryOp::LAnd => "and",
        BinaryOp::Eq => "equals",
        BinaryOp::Ne => "does not equal",
        BinaryOp::Lt => "is less than",
        BinaryOp::Le => "is less than or equal to",
        BinaryOp::Gt => "is greater than",
        BinaryOp::Ge => "is greater than or equal to",
        BinaryOp::Add => "plus",
        BinaryOp::Sub => "minus",
        BinaryOp::Or => "bitwise or",
        BinaryOp::Xor => "exclusive or",
        BinaryOp::Mul => "times",
        BinaryOp::Div => "divided by",
        BinaryOp::Mod => "modulo",
        BinaryOp::Shl => "shifted left by",
        BinaryOp::Shr => "shifted right by",
        BinaryOp::And => "bitwise and",
        BinaryOp::AndNot => "bitwise and not",
    }
}

fn unary_word(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Add => "positive",
        UnaryOp::Sub => "negative",
        UnaryOp::Not => "not",
        UnaryOp::Xor => "bitwise not",
        UnaryOp::Addr => "ref",
        UnaryOp::Recv => "receive from channel",
    }
}

/// One narration pass over a parsed file.
struct Engine<'a> {
    file: &'a SourceFile,
    src: &'a str,
    skip_imports: bool,
    filter: RangeFilter<'a>,
    out: SpeechBuffer,
}

impl<'a> Engine<'a> {
    fn new(
        file: &'a SourceFile,
        src: &'a str,
        map: &'a SourceMap,
        window: Window,
        skip_imports: bool,
    ) -> Self {
        Engine {
            file,
            src,
            skip_imports,
            filter: RangeFilter::new(window, map),
            out: SpeechBuffer::new(),
        }
    }

    fn run(mut self) -> SpeechBuffer {
        self.speak_file();
        self.out
    }

    /// Pushes one phrase, collapsing interior whitespace.
    fn speak(&mut self, phrase: &str) {
        let normal = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        self.out.push(&normal);
    }

    fn snippet(&self, span: Span) -> &'a str {
        let start = (span.start as usize).min(self.src.len());
        let end = (span.end as usize).min(self.src.len());
        &self.src[start..end]
    }

    fn expr_span(&self, id: ExprId) -> Span {
        self.file.arena.expr(id).span
    }

    fn stmt_span(&self, id: StmtId) -> Span {
        self.file.arena.stmt(id).span
    }

    fn with_function(&mut self, name: &str, f: impl FnOnce(&mut Self)) {
        self.filter.enter_function(name);
        f(self);
        self.filter.leave_function();
    }

    // ----- file and declarations ------------------------------------------

    fn speak_file(&mut self) {
        let file = self.file;
        if !file.package_name.text.is_empty() && self.filter.start_in(file.package_span) {
            self.speak(&format!("package {}", file.package_name.text));
        }
        if !self.skip_imports {
            self.speak_imports();
        }
        if !self.filter.restrictive() && !file.decls.is_empty() {
            self.speak("declarations");
        }
        for decl in &file.decls {
            match decl {
                TopLevelDecl::Func(f) => self.speak_func_decl(f),
                TopLevelDecl::Decl(id) => self.speak_decl(*id),
            }
        }
    }

    /// The "imports" header is emitted lazily, only once some import
    /// survives the window.
    fn speak_imports(&mut self) {
        let file = self.file;
        let mut spoke_header = false;
        for imp in &file.imports {
            if !self.filter.contains(imp.span) {
                continue;
            }
            let mut phrase = transcribe(&imp.path.text);
            if let Some(alias) = &imp.alias {
                phrase = format!("{phrase} as {}", transcribe(&alias.text));
            }
            if !spoke_header {
                self.speak("imports");
                spoke_header = true;
            }
            self.speak(&phrase);
        }
    }

    fn speak_func_decl(&mut self, f: &'a FuncDecl) {
        debug!(function = %f.name.text, "narrating function declaration");
        self.with_function(&f.name.text, |e| {
            if e.filter.start_in(f.span) {
                e.speak(&format!("function {}", transcribe(&f.name.text)));
                if let Some(recv) = &f.recv {
                    if !recv.fields.is_empty() {
                        e.speak_field_list(Some(recv), "with", "receiver", None);
                    }
                }
                e.speak_field_list(
                    f.signature.params.as_ref(),
                    "taking",
                    "parameter",
                    Some(f.span),
                );
                e.speak_field_list(
                    f.signature.results.as_ref(),
                    "and returning",
                    "value",
                    Some(f.span),
                );
            }
            if let Some(body) = &f.body {
                let close = format!("end function {}", transcribe(&f.name.text));
                e.speak_block(body, "function body", &close);
            }
        });
    }

    fn speak_decl(&mut self, id: DeclId) {
        let spanned = self.file.arena.decl(id);
        let span = spanned.span;
        match &spanned.node {
            Decl::Gen(gen) => {
                for spec in &gen.specs {
                    match &spec.node {
                        Spec::Value(vs) => {
                            let keyword = match gen.kind {
                                GenDeclKind::Const => "constant",
                                _ => "var",
                            };
                            self.speak_value_spec(vs, spec.span, keyword);
                        }
                        Spec::Type(ts) => self.speak_type_spec(ts, spec.span),
                    }
                }
            }
            Decl::Bad => {
                if self.filter.contains(span) {
                    self.speak("Bad declaration");
                    let text = self.snippet(span);
                    self.speak(&transcribe(text));
                }
            }
        }
    }

    fn speak_value_spec(&mut self, vs: &'a ValueSpec, span: Span, keyword: &str) {
        let mut keyword = keyword.to_string();
        if vs.names.len() > 1 {
            keyword.push('s');
        }
        if self.filter.start_in(span) {
            self.speak(&keyword);
        }
        for (i, name) in vs.names.iter().enumerate() {
            if self.filter.contains(name.span) {
                self.speak(&transcribe(&name.text));
                self.speak("of type");
            }
            if let Some(typ) = vs.typ {
                self.speak_type(typ);
            }
            if let Some(&value) = vs.values.get(i) {
                if self.filter.contains(self.expr_span(value)) {
                    self.speak("equals");
                }
                self.speak_expr(value);
            }
        }
    }

    fn speak_type_spec(&mut self, ts: &'a TypeSpec, span: Span) {
        if self.filter.contains(span) {
            self.speak("type");
            self.speak(&transcribe(&ts.name.text));
            self.speak("is");
        }
        self.speak_type(ts.typ);
    }

    // ----- field lists ----------------------------------------------------

    /// Narrates a field list with its counted header, e.g. "taking 2
    /// parameters". `parent` gates the header when the list itself is absent.
    fn speak_field_list(
        &mut self,
        fields: Option<&'a FieldList>,
        intro: &str,
        noun: &str,
        parent: Option<Span>,
    ) {
        let Some(fields) = fields else {
            if let Some(parent) = parent {
                if self.filter.start_in(parent) {
                    self.speak(&format!("{intro} no {noun}s"));
                }
            }
            return;
        };
        let count = fields.num_fields();
        if self.filter.start_in(fields.span) {
            match count {
                0 => self.speak(&format!("{intro} no {noun}s")),
                1 => self.speak(&format!("{intro} 1 {noun}")),
                n => self.speak(&format!("{intro} {n} {noun}s")),
            }
        }
        for field in &fields.fields {
            self.speak_field(field);
        }
    }

    fn speak_field(&mut self, field: &'a Field) {
        let link = if field.names.len() > 1 { "all as" } else { "as" };
        for name in &field.names {
            if self.filter.contains(name.span) {
                self.speak(&transcribe(&name.text));
            }
        }
        let typ_span = self.file.arena.typ(field.typ).span;
        if self.filter.contains(typ_span) {
            self.speak(link);
            if field.variadic {
                self.speak("variable number of");
            }
            self.speak_type(field.typ);
        }
        if let Some(tag) = field.tag {
            if self.filter.contains(self.expr_span(tag)) {
                self.speak("with tag");
            }
            self.speak_expr(tag);
        }
    }

    // ----- types ----------------------------------------------------------

    fn speak_type(&mut self, id: TypeId) {
        let spanned = self.file.arena.typ(id);
        let span = spanned.span;
        match &spanned.node {
            Type::Named { pkg, name } => {
                if let Some(pkg) = pkg {
                    if self.filter.contains(pkg.span) {
                        self.speak(&transcribe(&pkg.text));
                    }
                    if self.filter.contains(name.span) {
                        self.speak("dot");
                        self.speak(&transcribe(&name.text));
                    }
                } else if self.filter.contains(name.span) {
                    self.speak(&transcribe(&name.text));
                }
            }
            Type::Pointer(elem) => {
                if self.filter.contains(span) {
                    self.speak("pointer to");
                }
                self.speak_type(*elem);
            }
            Type::Slice(elem) => {
                if self.filter.contains(span) {
                    self.speak("slice of");
                }
                self.speak_type(*elem);
            }
            Type::Array { len, elem } => {
                if self.filter.contains(span) {
                    match len {
                        Some(len) => {
                            self.speak_expr(*len);
                            if self.filter.end_in(self.expr_span(*len)) {
                                self.speak("element");
                                self.speak("array of");
                            }
                        }
                        None => {
                            self.speak("variable number");
                            self.speak("element");
                            self.speak("array of");
                        }
                    }
                }
                self.speak_type(*elem);
            }
            Type::Map { key, value } => {
                if self.filter.start_in(span) {
                    self.speak("map");
                }
                let key_span = self.file.arena.typ(*key).span;
                let value_span = self.file.arena.typ(*value).span;
                if self.filter.start_in(key_span) {
                    self.speak("with");
                }
                self.speak_type(*key);
                if self.filter.end_in(key_span) {
                    self.speak("key");
                }
                if self.filter.start_in(value_span) {
                    self.speak("and");
                }
                self.speak_type(*value);
                if self.filter.end_in(value_span) {
                    self.speak("value");
                }
            }
            Type::Chan { dir, elem } => {
                if self.filter.start_in(span) {
                    match dir {
                        ChanDir::Send => self.speak("send to channel"),
                        _ => self.speak("received from channel"),
                    }
                }
                self.speak_type(*elem);
            }
            Type::Struct { fields } => {
                if fields.fields.is_empty() {
                    if self.filter.start_in(span) {
                        self.speak("empty struct");
                    }
                } else {
                    if self.filter.start_in(span) {
                        self.speak("struct");
                    }
                    self.speak_field_list(Some(fields), "having", "field", Some(span));
                }
            }
            Type::Interface { methods } => {
                if methods.fields.is_empty() {
                    if self.filter.contains(span) {
                        self.speak("empty interface");
                    }
                } else {
                    if self.filter.contains(span) {
                        self.speak("interface");
                    }
                    self.speak_field_list(Some(methods), "having", "method", Some(span));
                }
            }
            Type::Func { signature } => {
                if self.filter.start_in(span) {
                    self.speak("function");
                }
                self.speak_field_list(signature.params.as_ref(), "taking", "parameter", Some(span));
                self.speak_field_list(
                    signature.results.as_ref(),
                    "and returning",
                    "value",
                    Some(span),
                );
            }
            Type::Paren(inner) => {
                if self.filter.pos_in(span.start) {
                    self.speak("left paren");
                }
                self.speak_type(*inner);
                if self.filter.pos_in(span.end.saturating_sub(1)) {
                    self.speak("right paren");
                }
            }
            Type::Bad => {
                if self.filter.start_in(span) {
                    self.speak("Bad expression");
                }
                let text = self.snippet(span);
                self.speak(&transcribe(text));
            }
        }
    }

    // ----- expressions ----------------------------------------------------

    fn speak_expr(&mut self, id: ExprId) {
        let spanned = self.file.arena.expr(id);
        let span = spanned.span;
        match &spanned.node {
            Expr::Ident(text) => {
                if self.filter.contains(span) {
                    self.speak(&transcribe(text));
                }
            }
            Expr::BasicLit(lit) => {
                if self.filter.start_in(span) {
                    match lit.kind {
                        BasicLitKind::String => {
                            let speech = string_speech(&lit.text);
                            self.speak(&speech);
                        }
                        _ => self.speak(&lit.text),
                    }
                }
            }
            Expr::Star(operand) => {
                if self.filter.contains(span) {
                    self.speak("contents of");
                }
                self.speak_expr(*operand);
            }
            Expr::Selector { expr, sel } => {
                self.speak_expr(*expr);
                if self.filter.contains(sel.span) {
                    self.speak("dot");
                    self.speak(&transcribe(&sel.text));
                }
            }
            Expr::Binary {
                left,
                op,
                op_span,
                right,
            } => {
                self.speak_expr(*left);
                if self.filter.pos_in(op_span.start) {
                    self.speak(binary_word(*op));
                }
                self.speak_expr(*right);
            }
            Expr::Unary { op, op_span, expr } => {
                if self.filter.pos_in(op_span.start) {
                    self.speak(unary_word(*op));
                }
                self.speak_expr(*expr);
            }
            Expr::Paren {
                l_paren,
                expr,
                r_paren,
            } => {
                if self.filter.pos_in(l_paren.start) {
                    self.speak("left paren");
                }
                self.speak_expr(*expr);
                if self.filter.pos_in(r_paren.start) {
                    self.speak("right paren");
                }
            }
            Expr::Call {
                fun,
                l_paren,
                args,
                ellipsis,
            } => {
                if args.is_empty() && self.filter.start_in(span) {
                    self.speak("call");
                }
                self.speak_expr(*fun);
                if !args.is_empty() && self.filter.pos_in(l_paren.start) {
                    self.speak("of");
                }
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 && self.filter.start_in(self.expr_span(arg)) {
                        self.speak("comma");
                    }
                    self.speak_expr(arg);
                }
                if let Some(ellipsis) = ellipsis {
                    if self.filter.pos_in(ellipsis.start) {
                        self.speak("ellipsis");
                    }
                }
            }
            Expr::Index {
                expr,
                l_brack,
                index,
            } => {
                self.speak_expr(*expr);
                if self.filter.pos_in(l_brack.start) {
                    self.speak("sub");
                }
                self.speak_expr(*index);
            }
            Expr::Slice {
                expr,
                l_brack,
                low,
                high,
                max,
                r_brack,
            } => {
                if self.filter.start_in(span) {
                    self.speak("slice");
                }
                self.speak_expr(*expr);
                if self.filter.pos_in(l_brack.start) {
                    self.speak("from");
                }
                match low {
                    Some(low) => self.speak_expr(*low),
                    None => {
                        if self.filter.pos_in(l_brack.start) {
                            self.speak("start");
                        }
                    }
                }
                match high {
                    Some(high) => {
                        if self.filter.contains(self.expr_span(*high)) {
                            self.speak("to");
                        }
                        self.speak_expr(*high);
                    }
                    None => {
                        if self.filter.pos_in(r_brack.start) {
                            self.speak("to end");
                        }
                    }
                }
                if let Some(max) = max {
                    if self.filter.contains(self.expr_span(*max)) {
                        self.speak("with cap");
                    }
                    self.speak_expr(*max);
                }
            }
            Expr::CompositeLit {
                typ,
                l_brace,
                elements,
            } => {
                if elements.is_empty() && self.filter.start_in(span) {
                    self.speak("empty");
                }
                if let Some(typ) = typ {
                    self.speak_type(*typ);
                }
                if !elements.is_empty() && self.filter.pos_in(l_brace.start) {
                    self.speak("containing");
                }
                for (i, &element) in elements.iter().enumerate() {
                    if i > 0 && self.filter.start_in(self.expr_span(element)) {
                        self.speak("comma");
                    }
                    self.speak_expr(element);
                }
            }
            Expr::KeyValue { key, value } => {
                if self.filter.contains(self.expr_span(*key)) {
                    self.speak("key");
                }
                self.speak_expr(*key);
                if self.filter.contains(self.expr_span(*value)) {
                    self.speak("with value");
                }
                self.speak_expr(*value);
            }
            Expr::FuncLit { signature, body } => {
                if self.filter.start_in(span) {
                    self.speak("lambda");
                }
                self.speak_field_list(signature.params.as_ref(), "taking", "parameter", Some(span));
                self.speak_field_list(
                    signature.results.as_ref(),
                    "and returning",
                    "value",
                    Some(span),
                );
                self.speak_block(body, "is", "end lambda");
            }
            Expr::TypeAssert { expr, typ } => {
                self.speak_expr(*expr);
                let typ_visible = typ
                    .map(|t| self.filter.start_in(self.file.arena.typ(t).span))
                    .unwrap_or(false);
                if typ_visible || self.filter.end_in(self.expr_span(*expr)) {
                    self.speak("as type");
                }
                if let Some(typ) = typ {
                    self.speak_type(*typ);
                }
            }
            Expr::TypeRef(typ) => self.speak_type(*typ),
            Expr::Bad => {
                if self.filter.start_in(span) {
                    self.speak("Bad expression");
                }
                let text = self.snippet(span);
                self.speak(&transcribe(text));
            }
        }
    }

    // ----- statements -----------------------------------------------------

    fn speak_block(&mut self, block: &'a Block, open: &str, close: &str) {
        if self.filter.start_in(block.span) {
            self.speak(open);
        }
        for &stmt in &block.stmts {
            self.speak_stmt(stmt);
        }
        if self.filter.end_in(block.span) {
            self.speak(close);
        }
    }

    fn speak_stmt(&mut self, id: StmtId) {
        let spanned = self.file.arena.stmt(id);
        let span = spanned.span;
        match &spanned.node {
            Stmt::Decl(decl) => self.speak_decl(*decl),
            Stmt::Empty => {
                if self.filter.contains(span) {
                    self.speak("empty");
                }
            }
            Stmt::Expr(expr) => self.speak_expr(*expr),
            Stmt::Block(block) => {
                if self.filter.contains(span) {
                    self.speak("begin block");
                }
                for &stmt in &block.stmts {
                    self.speak_stmt(stmt);
                }
                if self.filter.contains(span) {
                    self.speak("end block");
                }
            }
            Stmt::Labeled { label, stmt } => {
                if self.filter.start_in(span) {
                    self.speak("label");
                    self.speak(&transcribe(&label.text));
                }
                self.speak_stmt(*stmt);
            }
            Stmt::Send { chan, value } => {
                if self.filter.start_in(span) {
                    self.speak("send");
                }
                self.speak_expr(*value);
                if self.filter.contains(self.expr_span(*chan)) {
                    self.speak("to channel");
                }
                self.speak_expr(*chan);
            }
            Stmt::IncDec { expr, op } => {
                if self.filter.start_in(span) {
                    match op {
                        IncDecOp::Inc => self.speak("increment"),
                        IncDecOp::Dec => self.speak("decrement"),
                    }
                }
                self.speak_expr(*expr);
            }
            Stmt::Assign { lhs, rhs, .. } => self.speak_assign(span, lhs, rhs),
            Stmt::Go(call) => {
                if self.filter.start_in(span) {
                    self.speak("go");
                }
                self.speak_expr(*call);
            }
            Stmt::Defer(call) => {
                if self.filter.start_in(span) {
                    self.speak("defer");
                }
                self.speak_expr(*call);
            }
            Stmt::Return(values) => {
                if self.filter.start_in(span) {
                    self.speak("return");
                }
                for (i, &value) in values.iter().enumerate() {
                    if i > 0 && self.filter.start_in(self.expr_span(value)) {
                        self.speak("also");
                    }
                    self.speak_expr(value);
                }
            }
            Stmt::Branch { kind, label } => {
                if self.filter.start_in(span) {
                    self.speak(kind.word());
                }
                if let Some(label) = label {
                    if self.filter.contains(label.span) {
                        self.speak("at");
                    }
                    self.speak(&transcribe(&label.text));
                }
            }
            Stmt::If(if_stmt) => self.speak_if(span, if_stmt),
            Stmt::For(for_stmt) => self.speak_for(span, for_stmt),
            Stmt::Switch(switch) => self.speak_switch(span, switch),
            Stmt::TypeSwitch(switch) => self.speak_type_switch(span, switch),
            Stmt::Select(select) => self.speak_select(span, select),
            Stmt::Bad => {
                if self.filter.start_in(span) {
                    self.speak("Bad statement");
                }
                let text = self.snippet(span);
                self.speak(&transcribe(text));
            }
        }
    }

    /// Parallel assignments pair each side; otherwise the left sides are
    /// joined with "and" before a single "equal".
    fn speak_assign(&mut self, span: Span, lhs: &'a [ExprId], rhs: &'a [ExprId]) {
        if self.filter.start_in(span) {
            self.speak("let");
        }
        if lhs.len() > 1 && lhs.len() == rhs.len() {
            for (&l, &r) in lhs.iter().zip(rhs) {
                self.speak_expr(l);
                if self.filter.end_in(self.expr_span(l)) {
                    self.speak("equal");
                }
                self.speak_expr(r);
            }
        } else {
            for (i, &l) in lhs.iter().enumerate() {
                if i > 0 && self.filter.start_in(self.expr_span(l)) {
                    self.speak("and");
                }
                self.speak_expr(l);
            }
            if let Some(&first) = rhs.first() {
                if self.filter.start_in(self.expr_span(first)) {
                    self.speak("equal");
                }
            }
            for &r in rhs {
                self.speak_expr(r);
            }
        }
    }

    fn speak_if(&mut self, span: Span, if_stmt: &'a IfStmt) {
        if self.filter.start_in(span) {
            self.speak("if");
        }
        if let Some(init) = if_stmt.init {
            if self.filter.start_in(self.stmt_span(init)) {
                self.speak("with initializer");
            }
            self.speak_stmt(init);
            if self.filter.end_in(self.stmt_span(init)) {
                self.speak("when");
            }
        }
        self.speak_expr(if_stmt.cond);
        // With an else branch, "end if" moves past it.
        let then_close = if if_stmt.else_stmt.is_some() { "" } else { "end if" };
        self.speak_block(&if_stmt.then_block, "then", then_close);
        if let Some(else_stmt) = if_stmt.else_stmt {
            let else_node = &self.file.arena.stmt(else_stmt).node;
            if let Stmt::Block(block) = else_node {
                self.speak_block(block, "else", "end if");
            } else {
                if self.filter.start_in(self.stmt_span(else_stmt)) {
                    self.speak("else");
                }
                self.speak_stmt(else_stmt);
            }
        }
    }

    fn speak_for(&mut self, span: Span, for_stmt: &'a ForStmt) {
        match &for_stmt.kind {
            ForKind::Infinite => {
                if self.filter.start_in(span) {
                    self.speak("for ever");
                }
                self.speak_block(&for_stmt.block, "do", "end for loop");
            }
            // Only a bare condition relabels the loop as a while loop; a
            // clause with just a post part still reads as "for".
            ForKind::Cond(cond) => {
                if self.filter.start_in(span) {
                    self.speak("while");
                }
                self.speak_expr(*cond);
                self.speak_block(&for_stmt.block, "do", "end while loop");
            }
            ForKind::Clause { init, cond, post } => {
                if self.filter.start_in(span) {
                    self.speak("for");
                }
                if let Some(init) = init {
                    self.speak_stmt(*init);
                }
                if let Some(cond) = cond {
                    if self.filter.start_in(self.expr_span(*cond)) {
                        self.speak("while");
                    }
                    self.speak_expr(*cond);
                }
                if let Some(post) = post {
                    self.speak_stmt(*post);
                }
                self.speak_block(&for_stmt.block, "do", "end for loop");
            }
            ForKind::Range {
                key, value, expr, ..
            } => {
                if self.filter.start_in(span) {
                    self.speak("range over");
                }
                self.speak_expr(*expr);
                let with_visible = match (key, value) {
                    (Some(key), _) => self.filter.start_in(self.expr_span(*key)),
                    (None, Some(value)) => self.filter.start_in(self.expr_span(*value)),
                    (None, None) => false,
                };
                if with_visible {
                    self.speak("with");
                }
                if let Some(key) = key {
                    if self.filter.start_in(self.expr_span(*key)) {
                        self.speak("key");
                    }
                    self.speak_expr(*key);
                    if let Some(value) = value {
                        if self.filter.start_in(self.expr_span(*value)) {
                            self.speak("and");
                        }
                    }
                }
                if let Some(value) = value {
                    if self.filter.contains(self.expr_span(*value)) {
                        self.speak("value");
                    }
                    self.speak_expr(*value);
                }
                self.speak_block(&for_stmt.block, "range body", "end range");
            }
        }
    }

    fn speak_switch(&mut self, span: Span, switch: &'a SwitchStmt) {
        if self.filter.start_in(span) {
            self.speak("switch");
        }
        if let Some(init) = switch.init {
            if self.filter.start_in(self.stmt_span(init)) {
                self.speak("with initializer");
            }
            self.speak_stmt(init);
        }
        if let Some(tag) = switch.tag {
            if self.filter.start_in(self.expr_span(tag)) {
                self.speak("on");
            }
            self.speak_expr(tag);
        }
        for clause in &switch.clauses {
            self.speak_switch_clause(clause);
        }
        if self.filter.end_in(switch.body_span) {
            self.speak("end switch");
        }
    }

    fn speak_type_switch(&mut self, span: Span, switch: &'a TypeSwitchStmt) {
        if self.filter.start_in(span) {
            self.speak("switch");
        }
        if let Some(init) = switch.init {
            if self.filter.start_in(self.stmt_span(init)) {
                self.speak("with initializer");
            }
            self.speak_stmt(init);
        }
        if self.filter.start_in(span) {
            self.speak("on type");
        }
        if let Some(bind) = &switch.bind {
            if self.filter.start_in(bind.span) {
                self.speak("let");
            }
            if self.filter.contains(bind.span) {
                self.speak(&transcribe(&bind.text));
            }
            if self.filter.start_in(self.expr_span(switch.expr)) {
                self.speak("equal");
            }
        }
        self.speak_expr(switch.expr);
        if self.filter.end_in(self.expr_span(switch.expr)) {
            self.speak("as type");
        }
        for clause in &switch.clauses {
            self.speak_switch_clause(clause);
        }
        if self.filter.end_in(switch.body_span) {
            self.speak("end type switch");
        }
    }

    fn speak_switch_clause(&mut self, clause: &'a Spanned<SwitchClause>) {
        match &clause.node {
            SwitchClause::Expr { exprs, stmts } => {
                if self.filter.start_in(clause.span) {
                    self.speak("case");
                }
                for (i, &expr) in exprs.iter().enumerate() {
                    if i > 0 && self.filter.start_in(self.expr_span(expr)) {
                        self.speak("or");
                    }
                    self.speak_expr(expr);
                }
                for &stmt in stmts {
                    self.speak_stmt(stmt);
                }
            }
            SwitchClause::Type { types, stmts } => {
                if self.filter.start_in(clause.span) {
                    self.speak("case");
                }
                for (i, &typ) in types.iter().enumerate() {
                    if i > 0 && self.filter.start_in(self.file.arena.typ(typ).span) {
                        self.speak("or");
                    }
                    self.speak_type(typ);
                }
                for &stmt in stmts {
                    self.speak_stmt(stmt);
                }
            }
            SwitchClause::Default { stmts } => {
                if self.filter.start_in(clause.span) {
                    self.speak("default");
                }
                for &stmt in stmts {
                    self.speak_stmt(stmt);
                }
            }
        }
    }

    fn speak_select(&mut self, span: Span, select: &'a SelectStmt) {
        if self.filter.start_in(span) {
            self.speak("select");
        }
        for clause in &select.clauses {
            match &clause.node {
                CommClause::Comm { comm, stmts } => {
                    if self.filter.start_in(clause.span) {
                        self.speak("case");
                    }
                    self.speak_comm(comm);
                    for &stmt in stmts {
                        self.speak_stmt(stmt);
                    }
                }
                CommClause::Default { stmts } => {
                    if self.filter.start_in(clause.span) {
                        self.speak("default");
                    }
                    for &stmt in stmts {
                        self.speak_stmt(stmt);
                    }
                }
            }
        }
        if self.filter.end_in(select.body_span) {
            self.speak("end select");
        }
    }

    fn speak_comm(&mut self, comm: &'a CommStmt) {
        match comm {
            CommStmt::Send { chan, value } => {
                let span = self.expr_span(*chan).to(self.expr_span(*value));
                if self.filter.start_in(span) {
                    self.speak("send");
                }
                self.speak_expr(*value);
                if self.filter.contains(self.expr_span(*chan)) {
                    self.speak("to channel");
                }
                self.speak_expr(*chan);
            }
            CommStmt::Recv { lhs, expr, .. } => {
                if lhs.is_empty() {
                    self.speak_expr(*expr);
                } else {
                    let span = self.expr_span(lhs[0]).to(self.expr_span(*expr));
                    self.speak_assign(span, lhs, std::slice::from_ref(expr));
                }
            }
        }
    }
}

/// Line windows must run forward.
fn validate_window(window: &Window) -> Result<(), NarrateError> {
    if let Window::Lines(start, end) = *window {
        if end < start {
            return Err(NarrateError::InvalidRange { start, end });
        }
    }
    Ok(())
}

/// Filename as spoken in the file-not-found phrase.
fn speakable_filename(path: &Path) -> String {
    let name = path.display().to_string();
    match name.strip_suffix(".go") {
        Some(stem) => format!("{stem} dot go"),
        None => name,
    }
}

/// Configuration for a [`Narrator`].
#[derive(Debug, Clone, Default)]
pub struct NarratorOptions {
    /// Build the narration but do not invoke the speech backend.
    pub quiet: bool,
    /// Leave import declarations out of the narration.
    pub skip_imports: bool,
    /// Persist the backend output to this audio file instead of playing it.
    pub audio_output: Option<PathBuf>,
}

struct LoadedSource {
    src: String,
    file: SourceFile,
    map: SourceMap,
}

/// Loads Go sources and narrates them under a chosen window.
///
/// A narrator can load once and then run several passes (whole file, one
/// function, a line range) over the same tree.
pub struct Narrator {
    opts: NarratorOptions,
    loaded: Option<LoadedSource>,
}

impl Narrator {
    pub fn new(opts: NarratorOptions) -> Self {
        Narrator { opts, loaded: None }
    }

    /// Parses the named file. Missing files are reported as
    /// [`NarrateError::MissingSource`] without touching previously loaded
    /// state.
    pub fn load_file(&mut self, path: &Path) -> Result<(), NarrateError> {
        if !path.exists() {
            return Err(NarrateError::MissingSource(path.to_path_buf()));
        }
        let src = std::fs::read_to_string(path)?;
        self.load_source(src)
    }

    /// Parses an in-memory source buffer.
    pub fn load_str(&mut self, src: &str) -> Result<(), NarrateError> {
        self.load_source(src.to_string())
    }

    fn load_source(&mut self, src: String) -> Result<(), NarrateError> {
        let (file, diags) = parse_source(&src)?;
        if !diags.is_empty() {
            warn!(
                errors = diags.len(),
                "source had syntax errors, narrating the recovered tree"
            );
        }
        let map = SourceMap::new(&src);
        self.loaded = Some(LoadedSource { src, file, map });
        Ok(())
    }

    /// Runs one narration pass, returning the pause-marked transcript.
    pub fn narration(&self, window: Window) -> Result<String, NarrateError> {
        Ok(self.narrate_window(window)?.text().to_string())
    }

    fn narrate_window(&self, window: Window) -> Result<SpeechBuffer, NarrateError> {
        validate_window(&window)?;
        let loaded = self.loaded.as_ref().ok_or(NarrateError::NothingLoaded)?;
        let engine = Engine::new(
            &loaded.file,
            &loaded.src,
            &loaded.map,
            window,
            self.opts.skip_imports,
        );
        Ok(engine.run())
    }

    fn perform(&self, window: Window) -> Result<String, NarrateError> {
        let out = self.narrate_window(window)?;
        if !self.opts.quiet {
            backend::speak(
                &out.materialize(backend::SILENCE),
                self.opts.audio_output.as_deref(),
            )?;
        }
        Ok(out.text().to_string())
    }

    /// Narrates the whole loaded file.
    pub fn speak_all(&self) -> Result<String, NarrateError> {
        self.perform(Window::All)
    }

    /// Narrates only the named function.
    pub fn speak_function(&self, name: &str) -> Result<String, NarrateError> {
        self.perform(Window::Function(name.to_string()))
    }

    /// Narrates an inclusive 1-based line range.
    pub fn speak_range(&self, start: u32, end: u32) -> Result<String, NarrateError> {
        self.perform(Window::Lines(start, end))
    }

    /// Loads `path` and narrates it whole. A missing file is spoken as an
    /// apology phrase before the error is returned.
    pub fn narrate_file(&mut self, path: &Path) -> Result<String, NarrateError> {
        match self.load_file(path) {
            Ok(()) => self.speak_all(),
            Err(NarrateError::MissingSource(p)) => {
                let phrase = format!("I can't find the file named {}", speakable_filename(&p));
                if !self.opts.quiet {
                    backend::speak(&phrase, self.opts.audio_output.as_deref())?;
                }
                Err(NarrateError::MissingSource(p))
            }
            Err(err) => Err(err),
        }
    }

    /// Loads `path` and narrates a single function.
    pub fn narrate_function(&mut self, path: &Path, function: &str) -> Result<String, NarrateError> {
        self.load_file(path)?;
        self.speak_function(function)
    }

    /// Loads `path` and narrates a line range. The range is checked before
    /// the file is touched.
    pub fn narrate_range(&mut self, path: &Path, start: u32, end: u32) -> Result<String, NarrateError> {
        validate_window(&Window::Lines(start, end))?;
        self.load_file(path)?;
        self.speak_range(start, end)
    }

    /// Narrates an in-memory source buffer whole.
    pub fn narrate_str(&mut self, src: &str) -> Result<String, NarrateError> {
        self.load_str(src)?;
        self.speak_all()
    }
}
