//! Property tests over generated Go sources.

use gonarrate::{Narrator, NarratorOptions, Window};
use proptest::prelude::*;

fn narrator_with(src: &str) -> Narrator {
    let mut narrator = Narrator::new(NarratorOptions {
        quiet: true,
        ..Default::default()
    });
    narrator.load_str(src).expect("load");
    narrator
}

fn ident() -> impl Strategy<Value = String> {
    // Prefixed so a generated name can never collide with a Go keyword.
    "[a-z0-9]{0,6}".prop_map(|s| format!("v{s}"))
}

fn decl() -> impl Strategy<Value = String> {
    prop_oneof![
        (ident(), 0u32..1000).prop_map(|(name, n)| format!("var {name} int = {n}\n")),
        (ident(), 0u32..1000).prop_map(|(name, n)| format!("const {name} = {n}\n")),
        (ident(), ident(), 0u32..1000).prop_map(|(name, param, n)| {
            format!("func {name}({param} int) int {{\n\treturn {param} + {n}\n}}\n")
        }),
        (ident(), ident()).prop_map(|(name, field)| {
            format!("type {name} struct {{\n\t{field} int\n}}\n")
        }),
    ]
}

fn source() -> impl Strategy<Value = String> {
    prop::collection::vec(decl(), 0..8).prop_map(|decls| {
        let mut src = String::from("package demo\n\n");
        for d in decls {
            src.push_str(&d);
            src.push('\n');
        }
        src
    })
}

/// Drops phrases a restrictive window never emits, so a full-file line range
/// can be compared against the unbounded narration.
fn strip_header(text: &str) -> String {
    text.lines()
        .filter(|line| *line != "declarations{pause}")
        .map(|line| format!("{line}\n"))
        .collect()
}

proptest! {
    #[test]
    fn full_line_range_matches_unbounded(src in source()) {
        let narrator = narrator_with(&src);
        let all = narrator.speak_all().expect("narrate");
        let lines = src.lines().count() as u32;
        let ranged = narrator.speak_range(1, lines.max(1)).expect("narrate");
        prop_assert_eq!(strip_header(&all), ranged);
    }

    #[test]
    fn narration_is_deterministic(src in source()) {
        let narrator = narrator_with(&src);
        let first = narrator.speak_all().expect("narrate");
        let second = narrator.speak_all().expect("narrate");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn function_window_is_a_subsequence(src in source()) {
        let narrator = narrator_with(&src);
        let all = narrator.speak_all().expect("narrate");
        let windowed = narrator.narration(Window::Function("v".into())).expect("narrate");
        let mut rest: Vec<&str> = all.split_whitespace().collect();
        for word in windowed.split_whitespace() {
            let pos = rest.iter().position(|w| *w == word);
            prop_assert!(pos.is_some(), "word {} missing from full narration", word);
            rest.drain(..=pos.unwrap());
        }
    }

    #[test]
    fn arbitrary_text_never_panics(src in "\\PC{0,200}") {
        let mut narrator = Narrator::new(NarratorOptions {
            quiet: true,
            ..Default::default()
        });
        // Errors are fine, panics are not.
        let _ = narrator.narrate_str(&src);
    }
}
