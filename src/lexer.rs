//! Go tokenizer (logos) with automatic semicolon insertion.
//!
//! The raw logos enum recognizes token shapes; [`tokenize`] maps them to
//! [`TokKind`], inserts the semicolons Go's grammar implies at newlines, and
//! collects lexical diagnostics instead of failing. The parser consumes the
//! whole token vector, so arbitrary lookahead is cheap.

use logos::Logos;
use unicode_ident::{is_xid_continue, is_xid_start};

use crate::ast::Span;
use crate::error::{Diag, LexErrorKind};

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum RawTok {
    #[regex(r"[\t\x0C\v ]+", logos::skip)]
    _Ws,

    // Newlines stay visible so semicolon insertion can trigger on them.
    #[regex(r"\r\n|\n|\r")]
    Newline,

    #[regex(r"//[^\n\r]*", logos::skip, allow_greedy = true)]
    _LineComment,

    // Not skipped: a block comment spanning lines acts as a newline.
    #[regex(r"(?s)/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r"[_\p{XID_Start}][_\p{XID_Continue}]*")]
    Ident,

    #[regex(r"`[^`]*`")]
    RawString,
    #[regex(r#""([^"\\\n\r]|\\.)*""#)]
    Str,
    #[regex(r"'([^'\\\n\r]|\\.)+'")]
    Rune,

    #[regex(r"0[bB][01_]+|0[oO][0-7_]+|0[xX][0-9a-fA-F_]+|[0-9][0-9_]*")]
    Int,
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?|[0-9][0-9_]*[eE][+-]?[0-9_]+|\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    Float,
    #[regex(r"([0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9_]+)?|\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?)i")]
    Imag,

    #[token("...")]
    Ellipsis,
    #[token("<<=")]
    ShlAssign,
    #[token(">>=")]
    ShrAssign,
    #[token("&^=")]
    AndNotAssign,
    #[token("+=")]
    AddAssign,
    #[token("-=")]
    SubAssign,
    #[token("*=")]
    MulAssign,
    #[token("/=")]
    DivAssign,
    #[token("%=")]
    ModAssign,
    #[token("&=")]
    AndAssign,
    #[token("|=")]
    OrAssign,
    #[token("^=")]
    XorAssign,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&^")]
    AndNot,
    #[token("&&")]
    LAnd,
    #[token("||")]
    LOr,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token(":=")]
    Define,
    #[token("<-")]
    Arrow,
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
}

/// Parser-facing token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokKind {
    Ident(String),
    Int(String),
    Float(String),
    Imag(String),
    Rune(String),
    Str(String),
    RawStr(String),

    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    Ellipsis,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    EqEq,
    NotEq,
    Le,
    Ge,
    Inc,
    Dec,
    Define,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Lt,
    Gt,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,

    /// Unrecognized input; the parser treats it as a recovery point.
    Error,
    Eof,
}

/// One token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokKind,
    pub span: Span,
}

fn keyword_or_ident(s: &str) -> TokKind {
    match s {
        "break" => TokKind::KwBreak,
        "case" => TokKind::KwCase,
        "chan" => TokKind::KwChan,
        "const" => TokKind::KwConst,
        "continue" => TokKind::KwContinue,
        "default" => TokKind::KwDefault,
        "defer" => TokKind::KwDefer,
        "else" => TokKind::KwElse,
        "fallthrough" => TokKind::KwFallthrough,
        "for" => TokKind::KwFor,
        "func" => TokKind::KwFunc,
        "go" => TokKind::KwGo,
        "goto" => TokKind::KwGoto,
        "if" => TokKind::KwIf,
        "import" => TokKind::KwImport,
        "interface" => TokKind::KwInterface,
        "map" => TokKind::KwMap,
        "package" => TokKind::KwPackage,
        "range" => TokKind::KwRange,
        "return" => TokKind::KwReturn,
        "select" => TokKind::KwSelect,
        "struct" => TokKind::KwStruct,
        "switch" => TokKind::KwSwitch,
        "type" => TokKind::KwType,
        "var" => TokKind::KwVar,
        _ => TokKind::Ident(s.to_string()),
    }
}

/// Go inserts a semicolon at a newline after these token classes.
fn closes_statement(kind: &TokKind) -> bool {
    matches!(
        kind,
        TokKind::Ident(_)
            | TokKind::Int(_)
            | TokKind::Float(_)
            | TokKind::Imag(_)
            | TokKind::Rune(_)
            | TokKind::Str(_)
            | TokKind::RawStr(_)
            | TokKind::KwBreak
            | TokKind::KwContinue
            | TokKind::KwFallthrough
            | TokKind::KwReturn
            | TokKind::Inc
            | TokKind::Dec
            | TokKind::RParen
            | TokKind::RBrack
            | TokKind::RBrace
    )
}

fn valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if first != '_' && !is_xid_start(first) {
        return false;
    }
    chars.all(|c| c == '_' || is_xid_continue(c))
}

/// Escape sequences legal inside interpreted string and rune literals.
fn valid_escapes(body: &str) -> bool {
    let mut it = body.chars();
    while let Some(c) = it.next() {
        if c != '\\' {
            continue;
        }
        match it.next() {
            Some('a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' | '"' | '\'') => {}
            Some('x') => {
                for _ in 0..2 {
                    match it.next() {
                        Some(h) if h.is_ascii_hexdigit() => {}
                        _ => return false,
                    }
                }
            }
            Some('u') | Some('U') => {
                // \u takes 4 hex digits, \U takes 8; checked loosely here,
                // the parser never needs the decoded value.
                match it.next() {
                    Some(h) if h.is_ascii_hexdigit() => {}
                    _ => return false,
                }
            }
            Some('0'..='7') => {}
            _ => return false,
        }
    }
    true
}

fn valid_number(text: &str) -> bool {
    !(text.starts_with('_') || text.ends_with('_') || text.contains("__"))
}

/// Tokenizes `src`, performing Go's automatic semicolon insertion.
///
/// Never fails: unrecognized input becomes [`TokKind::Error`] tokens plus
/// diagnostics. The returned vector always ends with [`TokKind::Eof`].
pub fn tokenize(src: &str) -> (Vec<Token>, Vec<Diag>) {
    let mut toks = Vec::new();
    let mut diags = Vec::new();
    let mut lex = RawTok::lexer(src);
    let mut semi_pending = false;

    let mut push = |toks: &mut Vec<Token>, kind: TokKind, span: Span| {
        toks.push(Token { kind, span });
    };

    while let Some(raw) = lex.next() {
        let range = lex.span();
        let span = Span::new(range.start, range.end);
        let slice = lex.slice();

        let raw = match raw {
            Ok(r) => r,
            Err(()) => {
                diags.push(Diag::lex(range, LexErrorKind::InvalidToken.to_string()));
                semi_pending = false;
                push(&mut toks, TokKind::Error, span);
                continue;
            }
        };

        let kind = match raw {
            RawTok::Newline => {
                if semi_pending {
                    semi_pending = false;
                    push(&mut toks, TokKind::Semi, Span::new(range.start, range.start));
                }
                continue;
            }
            RawTok::BlockComment => {
                if slice.contains('\n') && semi_pending {
                    semi_pending = false;
                    push(&mut toks, TokKind::Semi, Span::new(range.end, range.end));
                }
                continue;
            }
            RawTok::Ident => {
                if !valid_identifier(slice) {
                    diags.push(Diag::lex(range, LexErrorKind::InvalidToken.to_string()));
                    TokKind::Error
                } else {
                    keyword_or_ident(slice)
                }
            }
            RawTok::Int => {
                if !valid_number(slice) {
                    diags.push(Diag::lex(range, LexErrorKind::InvalidNumber.to_string()));
                }
                TokKind::Int(slice.to_string())
            }
            RawTok::Float => TokKind::Float(slice.to_string()),
            RawTok::Imag => TokKind::Imag(slice.to_string()),
            RawTok::Str => {
                if !valid_escapes(&slice[1..slice.len() - 1]) {
                    diags.push(Diag::lex(range, LexErrorKind::InvalidEscape.to_string()));
                }
                TokKind::Str(slice.to_string())
            }
            RawTok::Rune => {
                if !valid_escapes(&slice[1..slice.len() - 1]) {
                    diags.push(Diag::lex(range, LexErrorKind::InvalidEscape.to_string()));
                }
                TokKind::Rune(slice.to_string())
            }
            RawTok::RawString => TokKind::RawStr(slice.to_string()),

            RawTok::Ellipsis => TokKind::Ellipsis,
            RawTok::ShlAssign => TokKind::ShlAssign,
            RawTok::ShrAssign => TokKind::ShrAssign,
            RawTok::AndNotAssign => TokKind::AndNotAssign,
            RawTok::AddAssign => TokKind::AddAssign,
            RawTok::SubAssign => TokKind::SubAssign,
            RawTok::MulAssign => TokKind::MulAssign,
            RawTok::DivAssign => TokKind::DivAssign,
            RawTok::ModAssign => TokKind::ModAssign,
            RawTok::AndAssign => TokKind::AndAssign,
            RawTok::OrAssign => TokKind::OrAssign,
            RawTok::XorAssign => TokKind::XorAssign,
            RawTok::Shl => TokKind::Shl,
            RawTok::Shr => TokKind::Shr,
            RawTok::AndNot => TokKind::AndNot,
            RawTok::LAnd => TokKind::LAnd,
            RawTok::LOr => TokKind::LOr,
            RawTok::EqEq => TokKind::EqEq,
            RawTok::NotEq => TokKind::NotEq,
            RawTok::Le => TokKind::Le,
            RawTok::Ge => TokKind::Ge,
            RawTok::Inc => TokKind::Inc,
            RawTok::Dec => TokKind::Dec,
            RawTok::Define => TokKind::Define,
            RawTok::Arrow => TokKind::Arrow,
            RawTok::Assign => TokKind::Assign,
            RawTok::Plus => TokKind::Plus,
            RawTok::Minus => TokKind::Minus,
            RawTok::Star => TokKind::Star,
            RawTok::Slash => TokKind::Slash,
            RawTok::Percent => TokKind::Percent,
            RawTok::Amp => TokKind::Amp,
            RawTok::Pipe => TokKind::Pipe,
            RawTok::Caret => TokKind::Caret,
            RawTok::Tilde => TokKind::Tilde,
            RawTok::Bang => TokKind::Bang,
            RawTok::Lt => TokKind::Lt,
            RawTok::Gt => TokKind::Gt,
            RawTok::LParen => TokKind::LParen,
            RawTok::RParen => TokKind::RParen,
            RawTok::LBrack => TokKind::LBrack,
            RawTok::RBrack => TokKind::RBrack,
            RawTok::LBrace => TokKind::LBrace,
            RawTok::RBrace => TokKind::RBrace,
            RawTok::Comma => TokKind::Comma,
            RawTok::Semi => TokKind::Semi,
            RawTok::Colon => TokKind::Colon,
            RawTok::Dot => TokKind::Dot,
            RawTok::_Ws | RawTok::_LineComment => continue,
        };

        semi_pending = closes_statement(&kind);
        push(&mut toks, kind, span);
    }

    let end = src.len();
    if semi_pending {
        push(&mut toks, TokKind::Semi, Span::new(end, end));
    }
    push(&mut toks, TokKind::Eof, Span::new(end, end));

    (toks, diags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokKind> {
        tokenize(src).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn inserts_semicolon_after_ident_at_newline() {
        let ks = kinds("x\ny");
        assert_eq!(
            ks,
            vec![
                TokKind::Ident("x".into()),
                TokKind::Semi,
                TokKind::Ident("y".into()),
                TokKind::Semi,
                TokKind::Eof,
            ]
        );
    }

    #[test]
    fn no_semicolon_after_operator() {
        let ks = kinds("x +\ny");
        assert_eq!(
            ks,
            vec![
                TokKind::Ident("x".into()),
                TokKind::Plus,
                TokKind::Ident("y".into()),
                TokKind::Semi,
                TokKind::Eof,
            ]
        );
    }

    #[test]
    fn multiline_block_comment_acts_as_newline() {
        let ks = kinds("x /* a\nb */ y");
        assert_eq!(
            ks,
            vec![
                TokKind::Ident("x".into()),
                TokKind::Semi,
                TokKind::Ident("y".into()),
                TokKind::Semi,
                TokKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_and_strings() {
        let ks = kinds("func f() { return \"hi\" }");
        assert!(ks.contains(&TokKind::KwFunc));
        assert!(ks.contains(&TokKind::KwReturn));
        assert!(ks.contains(&TokKind::Str("\"hi\"".into())));
    }

    #[test]
    fn bad_input_becomes_error_token() {
        let (toks, diags) = tokenize("x @ y");
        assert!(toks.iter().any(|t| t.kind == TokKind::Error));
        assert!(!diags.is_empty());
    }
}
