use clap::Parser;
use flowdeck::prelude::*;
use serde::Deserialize;
use std::fs;

// --- JSON Deserialization Structs (Input Format Specific) ---
// These structs match the recording file format and are only used here.

#[derive(Deserialize)]
struct RawRecording {
    name: String,
    calls: Vec<CallDescriptor>,
}

/// Compiles OAuth2/OIDC flow descriptions into a replayable collection
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a recorded-calls JSON file ({"name": ..., "calls": [...]})
    recording_path: Option<String>,

    /// Also emit the full built-in catalog of protocol flows and scenarios
    #[arg(short, long)]
    builtin: bool,

    /// Collection name
    #[arg(short, long, default_value = "Identity flows")]
    name: String,

    /// Output path for the collection document
    #[arg(short, long, default_value = "collection.json")]
    out: String,

    /// Output path for the environment (seed) document
    #[arg(short, long, default_value = "environment.json")]
    env: String,

    /// Fixed uniqueness suffix, for reproducible output
    #[arg(short, long)]
    seed_suffix: Option<String>,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if cli.recording_path.is_none() && !cli.builtin {
        exit_with_error("Nothing to compile: pass a recording file, --builtin, or both.");
    }

    let mut builder = CollectionCompiler::builder(CredentialProfile::default()).with_name(cli.name);

    if cli.builtin {
        builder = builder.with_builtin_flows();
    }

    let mut conversion_warnings = 0usize;
    if let Some(path) = &cli.recording_path {
        let raw_json = fs::read_to_string(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to read recording file '{}': {}", path, e))
        });
        let raw: RawRecording = serde_json::from_str(&raw_json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse recording JSON: {}", e)));

        let normalizer = EndpointNormalizer::default();
        let (plan, diagnostics) = FlowPlan::from_descriptors(raw.name, raw.calls, &normalizer)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert recording: {}", e)));
        for diagnostic in &diagnostics {
            eprintln!("warning: {}", diagnostic);
        }
        conversion_warnings = diagnostics.len();
        builder = builder.with_recorded(plan);
    }

    if let Some(suffix) = cli.seed_suffix {
        builder = builder.with_uniqueness(Box::new(FixedUniqueness::new(suffix)));
    }

    let compiler = builder.build();
    let output = compiler
        .compile()
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));

    for diagnostic in &output.diagnostics {
        match diagnostic.severity() {
            Severity::Warning => eprintln!("warning: {}", diagnostic),
            Severity::Error => eprintln!("error: {}", diagnostic),
        }
    }

    let collection_json = serde_json::to_string_pretty(&output.document)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize collection: {}", e)));
    fs::write(&cli.out, collection_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", cli.out, e)));

    let seed_json = serde_json::to_string_pretty(&output.seed)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize environment: {}", e)));
    fs::write(&cli.env, seed_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", cli.env, e)));

    let warning_count = conversion_warnings
        + output
            .diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .count();
    let error_count = output
        .diagnostics
        .iter()
        .filter(|d| d.severity() == Severity::Error)
        .count();

    println!("Wrote collection to '{}'", cli.out);
    println!("Wrote environment to '{}'", cli.env);
    println!(
        "Build succeeded with {} warning(s) and {} unresolved-variable error(s).",
        warning_count, error_count
    );
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
