use gonarrate::{Narrator, NarratorOptions};
use walkdir::WalkDir;

#[test]
fn narrates_go_corpus_if_configured() {
    let Some(root) = std::env::var_os("GONARRATE_CORPUS") else {
        eprintln!("GONARRATE_CORPUS not set; skipping corpus test");
        return;
    };

    let root = root.to_string_lossy().to_string();
    let mut total = 0usize;

    let mut narrator = Narrator::new(NarratorOptions {
        quiet: true,
        ..Default::default()
    });

    for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }
        // Skip generated / known problematic dirs if desired.
        if path.to_string_lossy().contains("testdata") {
            continue;
        }

        total += 1;
        let src = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => continue,
        };

        match narrator.narrate_str(&src) {
            Ok(text) => {
                if text.is_empty() {
                    eprintln!("EMPTY narration: {}", path.display());
                }
            }
            Err(err) => {
                // Stop early so failures are fast to triage.
                panic!(
                    "Go corpus narration failed after {total} files at {}: {err}",
                    path.display()
                );
            }
        }
    }

    eprintln!("Narrated {total} Go files.");
}
