use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gonarrate::lexer::tokenize;
use gonarrate::{parse_source, Narrator, NarratorOptions, Window};
use std::hint::black_box as bb;

// =============================================================================
// Test Corpus - Different sizes of Go code
// =============================================================================

const SMALL_HELLO_WORLD: &str = r#"
package main

import "fmt"

func main() {
	fmt.Printf("Hello World!\n")
}
"#;

const MEDIUM_STRUCT_METHODS: &str = r#"
package geometry

type Point struct {
	X, Y float64
}

func (p Point) Abs() float64 {
	return sqrt(p.X*p.X + p.Y*p.Y)
}

func (p *Point) Scale(f float64) {
	p.X = p.X * f
	p.Y = p.Y * f
}

type Rectangle struct {
	Width, Height float64
}

func (r Rectangle) Area() float64 {
	return r.Width * r.Height
}

func (r *Rectangle) Grow(delta float64) {
	r.Width += delta
	r.Height += delta
}
"#;

const LARGE_CONTROL_FLOW: &str = r#"
package machine

import (
	"fmt"
	"strings"
)

type State int

const (
	Idle State = iota
	Running
	Stopped
)

type Machine struct {
	state State
	log   []string
	inbox chan string
}

func (m *Machine) Step(input string) error {
	switch m.state {
	case Idle:
		if strings.HasPrefix(input, "start") {
			m.state = Running
		}
	case Running:
		for i := 0; i < len(input); i++ {
			m.log = append(m.log, input[i:i+1])
		}
		if input == "stop" {
			m.state = Stopped
		}
	default:
		return fmt.Errorf("machine stopped: %q", input)
	}
	return nil
}

func (m *Machine) Drain() {
	for {
		select {
		case msg, ok := <-m.inbox:
			if !ok {
				return
			}
			m.log = append(m.log, msg)
		default:
			return
		}
	}
}

func (m *Machine) Dump() string {
	out := make([]string, 0, len(m.log))
	for i, entry := range m.log {
		out = append(out, fmt.Sprintf("%d: %s", i, entry))
	}
	return strings.Join(out, "\n")
}
"#;

const CORPORA: [(&str, &str); 3] = [
    ("small", SMALL_HELLO_WORLD),
    ("medium", MEDIUM_STRUCT_METHODS),
    ("large", LARGE_CONTROL_FLOW),
];

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    for (name, input) in CORPORA {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, &input| {
            b.iter(|| {
                let (toks, diags) = tokenize(bb(input));
                bb((toks.len(), diags.len()))
            });
        });
    }
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, input) in CORPORA {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, &input| {
            b.iter(|| {
                let (file, diags) = parse_source(bb(input)).expect("parse");
                bb((file.decls.len(), diags.len()))
            });
        });
    }
    group.finish();
}

fn bench_narrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("narrate");
    for (name, input) in CORPORA {
        // Load once; measure narration over the resident tree.
        let mut narrator = Narrator::new(NarratorOptions {
            quiet: true,
            ..Default::default()
        });
        narrator.load_str(input).expect("load");

        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("full", name), &narrator, |b, narrator| {
            b.iter(|| bb(narrator.speak_all().expect("narrate")));
        });
        group.bench_with_input(BenchmarkId::new("range", name), &narrator, |b, narrator| {
            b.iter(|| bb(narrator.speak_range(1, 10).expect("narrate")));
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    for (name, input) in CORPORA {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, &input| {
            b.iter(|| {
                let mut narrator = Narrator::new(NarratorOptions {
                    quiet: true,
                    ..Default::default()
                });
                narrator.load_str(bb(input)).expect("load");
                bb(narrator.narration(Window::All).expect("narrate"))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_parse,
    bench_narrate,
    bench_end_to_end
);
criterion_main!(benches);
