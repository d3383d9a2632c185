//! End-to-end narration checks over small Go snippets.

use gonarrate::{Narrator, NarratorOptions};

fn narrate(src: &str) -> String {
    let mut narrator = Narrator::new(NarratorOptions {
        quiet: true,
        ..Default::default()
    });
    narrator.narrate_str(src).expect("narration")
}

/// Spoken words in order, pause markers and quote pieces stripped.
fn words(text: &str) -> Vec<String> {
    text.replace("{pause}", " ")
        .split_whitespace()
        .filter(|w| *w != "\"")
        .map(str::to_string)
        .collect()
}

/// True when `needle` occurs as a contiguous run of words in `haystack`.
fn has_run(haystack: &[String], needle: &[&str]) -> bool {
    needle.is_empty()
        || haystack
            .windows(needle.len())
            .any(|w| w.iter().zip(needle).all(|(have, want)| have == want))
}

#[test]
fn hello_world_narration() {
    let src = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Printf(\"Hello World!\\n\")\n}\n";
    let got = words(&narrate(src));
    let want = [
        "package", "main", "imports", "fumt", "declarations", "function", "main", "taking", "no",
        "parameters", "and", "returning", "no", "values", "function", "body", "fumt", "dot",
        "print", "f", "of", "Hello", "World!", "backslash", "n", "end", "function", "main",
    ];
    assert_eq!(got, want.map(str::to_string).to_vec(), "full transcript:\n{got:?}");
}

#[test]
fn var_declaration_speaks_name_and_type() {
    let got = words(&narrate("package p\n\nvar foo int\n"));
    assert!(
        has_run(&got, &["var", "foo", "of", "type", "int"]),
        "got {got:?}"
    );
}

#[test]
fn empty_interface_type() {
    let got = words(&narrate("package p\n\nvar foo interface{}\n"));
    assert!(
        has_run(&got, &["var", "foo", "of", "type", "empty", "interface"]),
        "got {got:?}"
    );
}

#[test]
fn grouped_var_names_pluralize_keyword() {
    let got = words(&narrate("package p\n\nvar a, b int\n"));
    // "a" is transcribed phonetically as "eigh"; the type repeats per name.
    assert!(
        has_run(
            &got,
            &["vars", "eigh", "of", "type", "int", "b", "of", "type", "int"]
        ),
        "got {got:?}"
    );
}

#[test]
fn constant_declaration() {
    let got = words(&narrate("package p\n\nconst limit = 10\n"));
    assert!(
        has_run(&got, &["constant", "limit", "of", "type", "equals", "10"]),
        "got {got:?}"
    );
}

#[test]
fn type_declaration_with_struct() {
    let src = "package p\n\ntype Point struct {\n\tX, Y int\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(
            &got,
            &["type", "Point", "is", "struct", "having", "2", "fields", "X", "Y", "all", "as", "int"]
        ),
        "got {got:?}"
    );
}

#[test]
fn empty_struct_narrates_as_empty() {
    let got = words(&narrate("package p\n\ntype Unit struct{}\n"));
    assert!(has_run(&got, &["type", "Unit", "is", "empty", "struct"]), "got {got:?}");
}

#[test]
fn absent_and_empty_field_lists_narrate_alike() {
    // Empty parameter list, absent result list.
    let got = words(&narrate("package p\n\nfunc f() {\n}\n"));
    assert!(has_run(&got, &["taking", "no", "parameters"]), "got {got:?}");
    assert!(has_run(&got, &["and", "returning", "no", "values"]), "got {got:?}");
}

#[test]
fn named_parameters_and_single_result() {
    let src = "package p\n\nfunc add(x, y int) int {\n\treturn x + y\n}\n";
    let got = words(&narrate(src));
    assert!(has_run(&got, &["taking", "2", "parameters"]), "got {got:?}");
    assert!(has_run(&got, &["and", "returning", "1", "value"]), "got {got:?}");
    assert!(has_run(&got, &["return", "x", "plus", "y"]), "got {got:?}");
}

#[test]
fn parallel_assignment_pairs_sides() {
    let src = "package p\n\nfunc f() {\n\tvar x, y int\n\tx, y = 1, 2\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(&got, &["let", "x", "equal", "1", "y", "equal", "2"]),
        "got {got:?}"
    );
}

#[test]
fn multi_value_assignment_joins_left_sides() {
    let src = "package p\n\nfunc g() (int, int) {\n\treturn 1, 2\n}\n\nfunc f() {\n\tx, y := g()\n\t_, _ = x, y\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(&got, &["let", "x", "and", "y", "equal", "call", "g"]),
        "got {got:?}"
    );
}

#[test]
fn while_relabel_requires_bare_condition() {
    let src = "package p\n\nfunc f(n int) {\n\tfor n > 0 {\n\t\tn--\n\t}\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(&got, &["while", "n", "is", "greater", "than", "0", "do"]),
        "got {got:?}"
    );
    assert!(has_run(&got, &["end", "while", "loop"]), "got {got:?}");
}

#[test]
fn semicolon_only_condition_relabels_as_while() {
    // `for ; cond; { }` carries neither init nor post, so it is the same
    // loop as `for cond { }` and must read as a while loop.
    let src = "package p\n\nfunc f(n int) {\n\tfor ; n > 0; {\n\t\tn--\n\t}\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(&got, &["while", "n", "is", "greater", "than", "0", "do"]),
        "got {got:?}"
    );
    assert!(has_run(&got, &["end", "while", "loop"]), "got {got:?}");
    assert!(!got.contains(&"for".to_string()), "got {got:?}");
}

#[test]
fn bare_semicolons_read_as_for_ever() {
    let src = "package p\n\nfunc f() {\n\tfor ; ; {\n\t\tbreak\n\t}\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(&got, &["for", "ever", "do", "break", "end", "for", "loop"]),
        "got {got:?}"
    );
    assert!(!got.contains(&"while".to_string()), "got {got:?}");
}

#[test]
fn three_part_for_keeps_for_label() {
    let src = "package p\n\nfunc f() {\n\tfor i := 0; i < 10; i++ {\n\t}\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(
            &got,
            &["for", "let", "i", "equal", "0", "while", "i", "is", "less", "than", "10",
              "increment", "i", "do", "end", "for", "loop"]
        ),
        "got {got:?}"
    );
}

#[test]
fn infinite_loop() {
    let got = words(&narrate("package p\n\nfunc f() {\n\tfor {\n\t\tbreak\n\t}\n}\n"));
    assert!(has_run(&got, &["for", "ever", "do", "break", "end", "for", "loop"]), "got {got:?}");
}

#[test]
fn range_loop_with_key_and_value() {
    let src = "package p\n\nfunc f(xs []int) {\n\tfor i, x := range xs {\n\t\t_ = i\n\t\t_ = x\n\t}\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(
            &got,
            &["range", "over", "xs", "with", "key", "i", "and", "value", "x", "range", "body"]
        ),
        "got {got:?}"
    );
    assert!(has_run(&got, &["end", "range"]), "got {got:?}");
}

#[test]
fn if_else_suppresses_inner_end_if() {
    let src = "package p\n\nfunc f(x int) int {\n\tif x > 0 {\n\t\treturn 1\n\t} else {\n\t\treturn 2\n\t}\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(
            &got,
            &["if", "x", "is", "greater", "than", "0", "then", "return", "1", "else",
              "return", "2", "end", "if"]
        ),
        "got {got:?}"
    );
    // "end if" appears exactly once, after the else branch.
    let ends = got.windows(2).filter(|w| w[0] == "end" && w[1] == "if").count();
    assert_eq!(ends, 1);
}

#[test]
fn switch_with_cases() {
    let src = "package p\n\nfunc f(x int) {\n\tswitch x {\n\tcase 1, 2:\n\t\treturn\n\tdefault:\n\t\treturn\n\t}\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(&got, &["switch", "on", "x", "case", "1", "or", "2", "return", "default", "return", "end", "switch"]),
        "got {got:?}"
    );
}

#[test]
fn select_speaks_case_for_communications() {
    let src = "package p\n\nfunc f(ch chan int) {\n\tselect {\n\tcase v := <-ch:\n\t\t_ = v\n\tdefault:\n\t}\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(
            &got,
            &["select", "case", "let", "v", "equal", "receive", "from", "channel", "ch"]
        ),
        "got {got:?}"
    );
    assert!(has_run(&got, &["default", "end", "select"]), "got {got:?}");
}

#[test]
fn pointer_reads_differently_in_type_and_expression_position() {
    let src = "package p\n\nfunc f(p *int) {\n\t_ = *p\n}\n";
    let got = words(&narrate(src));
    assert!(has_run(&got, &["p", "as", "pointer", "to", "int"]), "got {got:?}");
    assert!(has_run(&got, &["contents", "of", "p"]), "got {got:?}");
}

#[test]
fn method_receiver_is_announced() {
    let src = "package p\n\ntype T struct{}\n\nfunc (t *T) Run() {\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(&got, &["function", "Run", "with", "1", "receiver", "t", "as", "pointer", "to", "T"]),
        "got {got:?}"
    );
}

#[test]
fn variadic_call_speaks_ellipsis_after_spread_argument() {
    let src = "package p\n\nfunc f(xs ...int) {\n\tf(xs...)\n}\n";
    let got = words(&narrate(src));
    assert!(has_run(&got, &["f", "of", "xs", "ellipsis"]), "got {got:?}");
}

#[test]
fn string_literal_edge_cases() {
    let src = "package p\n\nvar a = \"\"\nvar b = \" \"\nvar c = \"   \"\n";
    let text = narrate(src);
    assert!(text.contains("empty string"));
    assert!(text.contains("string with one blank"));
    assert!(text.contains("string of 3 blanks"));
}

#[test]
fn import_alias_is_spoken() {
    let src = "package p\n\nimport str \"strings\"\n";
    let got = words(&narrate(src));
    assert!(has_run(&got, &["imports", "strings", "as", "str"]), "got {got:?}");
}

#[test]
fn skip_imports_option() {
    let mut narrator = Narrator::new(NarratorOptions {
        quiet: true,
        skip_imports: true,
        ..Default::default()
    });
    let text = narrator
        .narrate_str("package p\n\nimport \"fmt\"\n")
        .expect("narration");
    assert!(!text.contains("imports"));
}

#[test]
fn lambda_narration() {
    let src = "package p\n\nfunc f() {\n\tg := func(x int) int {\n\t\treturn x\n\t}\n\t_ = g\n}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(
            &got,
            &["lambda", "taking", "1", "parameter", "x", "as", "int", "and", "returning",
              "1", "value", "as", "int", "is", "return", "x", "end", "lambda"]
        ),
        "got {got:?}"
    );
}

#[test]
fn composite_literal_with_keys() {
    let src = "package p\n\nvar m = map[string]int{\"a\": 1}\n";
    let got = words(&narrate(src));
    assert!(
        has_run(
            &got,
            &["map", "with", "string", "key", "and", "int", "value", "containing", "key", "a", "with", "value", "1"]
        ),
        "got {got:?}"
    );
}

#[test]
fn go_and_defer() {
    let src = "package p\n\nfunc f() {\n\tgo f()\n\tdefer f()\n}\n";
    let got = words(&narrate(src));
    assert!(has_run(&got, &["go", "call", "f", "defer", "call", "f"]), "got {got:?}");
}

#[test]
fn idempotent_narration() {
    let src = "package p\n\nfunc f() {\n\tfor i := 0; i < 3; i++ {\n\t}\n}\n";
    let mut narrator = Narrator::new(NarratorOptions {
        quiet: true,
        ..Default::default()
    });
    narrator.load_str(src).expect("load");
    let first = narrator.speak_all().expect("narrate");
    let second = narrator.speak_all().expect("narrate");
    assert_eq!(first, second);
}
