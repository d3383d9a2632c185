//! Phonetic transcription of identifiers and literals.
//!
//! Speech synthesizers mangle program identifiers ("fmt", "strconv"), so
//! identifiers are split into letter runs and punctuation, and each piece is
//! looked up in a pronunciation table before speaking.

/// Lowercased symbol piece to how it should be pronounced.
const TRANSLATIONS: &[(&str, &str)] = &[
    ("os", "oh ess"),
    ("github", "git hub"),
    ("fmt", "fumt"),
    ("printf", "print f"),
    ("sprintf", "s print f"),
    ("fprintf", "f print f"),
    (".", "dot"),
    (",", "comma"),
    ("/", "slash"),
    ("\\", "backslash"),
    ("utf", "you tee f"),
    ("ast", "eigh s t"),
    ("a", "eigh"),
    ("strconv", "stir conv"),
    ("_", "none"),
];

fn translate(piece: &str) -> &str {
    for (sym, speech) in TRANSLATIONS {
        if sym.eq_ignore_ascii_case(piece) {
            return speech;
        }
    }
    piece
}

/// Splits a symbol into maximal letter runs; every non-letter character
/// becomes its own piece.
fn split_symbol(symbol: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut run_start = None;
    for (i, ch) in symbol.char_indices() {
        if ch.is_alphabetic() {
            if run_start.is_none() {
                run_start = Some(i);
            }
        } else {
            if let Some(start) = run_start.take() {
                pieces.push(&symbol[start..i]);
            }
            pieces.push(&symbol[i..i + ch.len_utf8()]);
        }
    }
    if let Some(start) = run_start {
        pieces.push(&symbol[start..]);
    }
    pieces
}

/// Phonetic rendering of an identifier, package path, or operator symbol.
pub fn transcribe(symbol: &str) -> String {
    let pieces: Vec<&str> = split_symbol(symbol).into_iter().map(translate).collect();
    pieces.join(" ")
}

/// How an interpreted string literal is spoken. The `text` includes the
/// surrounding quotes as it appeared in source; raw string literals and
/// other literals pass through verbatim.
pub fn string_speech(text: &str) -> String {
    let Some(body) = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return text.to_string();
    };
    let body = body.replace('\\', " backslash ");
    if body.is_empty() {
        "empty string".to_string()
    } else if body.trim().is_empty() {
        if body.len() == 1 {
            "string with one blank".to_string()
        } else {
            format!("string of {} blanks", body.len())
        }
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_camel_free_symbols() {
        assert_eq!(split_symbol("foo_bar"), vec!["foo", "_", "bar"]);
        assert_eq!(split_symbol("x1y"), vec!["x", "1", "y"]);
        assert_eq!(split_symbol("abc"), vec!["abc"]);
    }

    #[test]
    fn translates_known_pieces() {
        assert_eq!(transcribe("fmt"), "fumt");
        assert_eq!(transcribe("os"), "oh ess");
        assert_eq!(transcribe("github.com/x"), "git hub dot com slash x");
        assert_eq!(transcribe("_"), "none");
    }

    #[test]
    fn translation_ignores_case() {
        assert_eq!(transcribe("FMT"), "fumt");
        assert_eq!(transcribe("Ast"), "eigh s t");
    }

    #[test]
    fn unknown_pieces_pass_through() {
        assert_eq!(transcribe("widget"), "widget");
    }

    #[test]
    fn string_literal_rules() {
        assert_eq!(string_speech("\"\""), "empty string");
        assert_eq!(string_speech("\" \""), "string with one blank");
        assert_eq!(string_speech("\"   \""), "string of 3 blanks");
        assert_eq!(string_speech("\"hi\\n\""), "hi backslash n");
        assert_eq!(string_speech("`raw`"), "`raw`");
    }
}
