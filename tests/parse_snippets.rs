use gonarrate::parse_source;

fn assert_parses(src: &str) {
    match parse_source(src) {
        Ok((_, diags)) if diags.is_empty() => {}
        Ok((_, diags)) => panic!("expected clean parse, got diagnostics: {diags:#?}"),
        Err(err) => panic!("expected parse ok, got {err}"),
    }
}

#[test]
fn parses_imports_and_decls() {
    assert_parses(
        r#"
package main

import (
    "fmt"
    . "math"
    _ "net/http"
)

const (
    A = 1
    B int = 2
)

var (
    x = 1
    y, z int
)

type (
    T = int
    U struct{ F int }
    V interface {
        M(x int) int
    }
)

func main() {
    fmt.Println(Sqrt(4))
}
"#,
    );
}

#[test]
fn parses_statements() {
    assert_parses(
        r#"
package p

func f(x int, ch chan int) int {
    if x < 0 { return -x }
    for i := 0; i < 10; i++ {
        if i == 5 { break }
        continue
    }
    for range []int{1, 2, 3} {
    }
    switch x {
    case 0, 1:
        x++
    default:
        x = 3
    }
    select {
    case ch <- x:
        return x
    default:
        return 0
    }
}
"#,
    );
}

#[test]
fn parses_expressions() {
    assert_parses(
        r#"
package p

func f(a, b, c int, ch chan<- int, done chan int) {
    _ = a + b*c - (a<<2)
    _ = a == b || a < c && b <= c
    _ = &a
    _ = <-done
    _ = []int{1, 2, 3}[0]
    _ = []int{1, 2, 3}[1:]
    _ = []int{1, 2, 3}[:2]
    _ = []int{1, 2, 3}[0:2:3]
    _ = map[string]int{"a": 1, "b": 2}["a"]
    g(a, b, c)
    g(a, b, c...)
}

func g(xs ...int) {}
"#,
    );
}

#[test]
fn parses_type_switch_and_labels() {
    assert_parses(
        r#"
package p

func f(v interface{}) {
loop:
    for {
        switch t := v.(type) {
        case int:
            _ = t
            break loop
        case string, error:
            continue loop
        default:
        }
    }
}
"#,
    );
}

#[test]
fn recovers_from_bad_declaration() {
    let (file, diags) = parse_source("package p\n\n@@@\n\nvar ok int\n").expect("partial tree");
    assert!(!diags.is_empty());
    // The valid declaration after the garbage still lands in the tree.
    assert!(!file.decls.is_empty());
}

#[test]
fn missing_package_clause_is_fatal() {
    assert!(parse_source("import \"fmt\"\n").is_err());
}
