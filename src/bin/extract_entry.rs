//! CLI that extracts bibliographic fields from entry directories.
//!
//! Usage: `extract_entry [--options FILE] [--no-cache] [--no-write] <entry-dir>...`
//!
//! Prints one JSON line per entry to stdout. Exits with status 1 if any
//! entry produced an `errors` record, 2 on usage errors.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use biblio_extract::record::CanonicalFields;
use biblio_extract::{ExtractionRecord, Extractor, Options};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Serialize)]
struct Output<'a> {
    entry: String,
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<CanonicalFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [String]>,
}

fn usage() -> ExitCode {
    eprintln!("usage: extract_entry [--options FILE] [--no-cache] [--no-write] <entry-dir>...");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,biblio_extract=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut options = Options::default();
    let mut entries: Vec<PathBuf> = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--options" => {
                let Some(path) = args.next() else {
                    return usage();
                };
                let loaded = fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|raw| Options::from_json(&raw).map_err(|e| e.to_string()));
                match loaded {
                    Ok(o) => options = o,
                    Err(e) => {
                        tracing::error!(path = %path, error = %e, "could not load options");
                        return ExitCode::from(2);
                    }
                }
            }
            "--no-cache" => options.use_cache = false,
            "--no-write" => options.write_outputs = false,
            "-h" | "--help" => return usage(),
            _ if arg.starts_with("--") => return usage(),
            _ => entries.push(PathBuf::from(arg)),
        }
    }
    if entries.is_empty() {
        return usage();
    }

    let extractor = Extractor::new(options);
    let mut failed = 0usize;

    for entry_dir in &entries {
        let record = extractor.extract(entry_dir);
        let output = match &record {
            ExtractionRecord::Fields { fields } => Output {
                entry: entry_dir.display().to_string(),
                kind: record.kind(),
                fields: Some(CanonicalFields::from_fields(fields)),
                errors: None,
            },
            ExtractionRecord::Errors { errors } => {
                failed += 1;
                Output {
                    entry: entry_dir.display().to_string(),
                    kind: record.kind(),
                    fields: None,
                    errors: Some(errors.as_slice()),
                }
            }
            other => {
                failed += 1;
                tracing::error!(kind = other.kind(), "non-terminal record returned");
                continue;
            }
        };
        match serde_json::to_string(&output) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!(error = %e, "could not serialize output"),
        }
    }

    tracing::info!(entries = entries.len(), failed, "done");
    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
