//! Command-line front end: reads Go source files aloud.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use gonarrate::speech::PAUSE;
use gonarrate::{Narrator, NarratorOptions};

#[derive(Parser, Debug)]
#[command(name = "saygo", version, about = "Reads Go source files aloud")]
struct Args {
    /// Go source files to narrate.
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Narrate only the named function.
    #[arg(long = "func", value_name = "NAME", conflicts_with_all = ["start", "end"])]
    function: Option<String>,

    /// First line to narrate (1-based, inclusive).
    #[arg(long, requires = "end")]
    start: Option<u32>,

    /// Last line to narrate (inclusive).
    #[arg(long, requires = "start")]
    end: Option<u32>,

    /// Save the speech to an audio file instead of playing it.
    #[arg(short, long, value_name = "AUDIO")]
    output: Option<PathBuf>,

    /// Build the narration without speaking it.
    #[arg(short, long)]
    quiet: bool,

    /// Leave import declarations out of the narration.
    #[arg(long)]
    no_imports: bool,

    /// Print each phrase as it is spoken.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    if let (Some(start), Some(end)) = (args.start, args.end) {
        if end < start {
            error!("end line ({end}) cannot be before start line ({start})");
            return ExitCode::FAILURE;
        }
    }

    let mut narrator = Narrator::new(NarratorOptions {
        quiet: args.quiet,
        skip_imports: args.no_imports,
        audio_output: args.output.clone(),
    });

    let mut failed = false;
    for file in &args.files {
        let result = if let Some(function) = &args.function {
            narrator.narrate_function(file, function)
        } else if let (Some(start), Some(end)) = (args.start, args.end) {
            narrator.narrate_range(file, start, end)
        } else {
            narrator.narrate_file(file)
        };
        match result {
            Ok(text) => {
                if args.verbose {
                    for phrase in text.lines() {
                        println!("Saying: {}", phrase.trim_end_matches(PAUSE));
                    }
                }
            }
            Err(err) => {
                error!(file = %file.display(), "{err}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
