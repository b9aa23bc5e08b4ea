//! `hsk`: command-line companion for hydraulic diagram files.
//!
//! ```text
//! hsk check <file.json>   validate a diagram and print a summary
//! hsk demo <out.json>     write the starter scene
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use hsk_core::{Document, NodeKind};
use hsk_editor::EditorSession;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

const USAGE: &str = "usage: hsk check <file.json> | hsk demo <out.json>";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str());
    let path = args.get(2).map(Path::new);

    match (command, path) {
        (Some("check"), Some(path)) => check(path),
        (Some("demo"), Some(path)) => demo(path),
        _ => {
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    }
}

// ── `hsk check` ─────────────────────────────────────────────────────────
// Loads the file through the normal all-or-nothing path, then reports
// counts per component kind.
fn check(path: &Path) -> ExitCode {
    let mut doc = Document::new();
    if let Err(e) = doc.load_from_file(path) {
        eprintln!("hsk check error: {}: {e}", path.display());
        return ExitCode::FAILURE;
    }

    let mut tally: BTreeMap<&'static str, usize> = BTreeMap::new();
    for node in doc.nodes() {
        *tally.entry(node.kind().as_str()).or_default() += 1;
    }

    println!(
        "{}: {} nodes, {} edges ({} x {})",
        path.display(),
        doc.nodes().len(),
        doc.edges().len(),
        doc.width(),
        doc.height()
    );
    for (kind, count) in &tally {
        println!("  {count:>4}  {kind}");
    }
    if tally.contains_key(NodeKind::Generic.as_str()) {
        log::warn!("{} contains components of unknown type", path.display());
    }
    ExitCode::SUCCESS
}

// ── `hsk demo` ──────────────────────────────────────────────────────────
fn demo(path: &Path) -> ExitCode {
    let result = EditorSession::with_demo().and_then(|mut session| session.file_save(Some(path)));
    match result {
        Ok(()) => {
            println!("wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("hsk demo error: {}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}
