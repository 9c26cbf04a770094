/// Corpus Linter: validates a dictionary, rule file and template corpus.
///
/// Usage: corpus_linter [--dictionary <path>] [--rules <path>] [--corpus <path>]
///                      [--config <path>] [--verbose]
///
/// Prints every warning and error found while loading and exits non-zero
/// when any error is reported.

use sentence_engine::core::config::GeneratorConfig;
use sentence_engine::core::lexicon::Lexicon;
use sentence_engine::core::registry::TemplateRegistry;
use sentence_engine::core::rules::RuleTable;
use sentence_engine::{Diagnostics, Level};
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!(
            "Usage: corpus_linter [--dictionary <path>] [--rules <path>] [--corpus <path>] [--config <path>] [--verbose]"
        );
        process::exit(0);
    }

    let mut dictionary_path = None;
    let mut rules_path = None;
    let mut corpus_path = None;
    let mut config_path = None;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dictionary" if i + 1 < args.len() => {
                i += 1;
                dictionary_path = Some(args[i].clone());
            }
            "--rules" if i + 1 < args.len() => {
                i += 1;
                rules_path = Some(args[i].clone());
            }
            "--corpus" if i + 1 < args.len() => {
                i += 1;
                corpus_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--verbose" | "-v" => verbose = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(2);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(ref path) => match GeneratorConfig::load_from_ron(Path::new(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to load config '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => GeneratorConfig::default(),
    };

    let mut errors = 0;
    let mut warnings = 0;

    let mut rules = RuleTable::new(config.language());
    if let Some(ref path) = rules_path {
        match rules.load_from_path(Path::new(path)) {
            Ok(d) => report(path, &d, verbose, &mut errors, &mut warnings),
            Err(e) => fail(path, e),
        }
        println!("Loaded {} rules", rules.len());
    }

    if let Some(ref path) = dictionary_path {
        let mut lexicon = Lexicon::new();
        match lexicon.load_from_path(Path::new(path)) {
            Ok(mut d) => {
                d.append(lexicon.validate(&rules));
                report(path, &d, verbose, &mut errors, &mut warnings);
            }
            Err(e) => fail(path, e),
        }
        println!("Loaded {} words", lexicon.len());
        if verbose {
            for word in lexicon.iter() {
                let forms = word.all_forms(&rules);
                if forms.is_empty() {
                    continue;
                }
                let rendered: Vec<String> =
                    forms.iter().map(|(id, text)| format!("{}={}", id, text)).collect();
                println!("  {}: {}", word.text, rendered.join(" "));
            }
        }
    }

    if let Some(ref path) = corpus_path {
        let mut registry = TemplateRegistry::new();
        match registry.load_from_path(Path::new(path)) {
            Ok(d) => report(path, &d, verbose, &mut errors, &mut warnings),
            Err(e) => fail(path, e),
        }
        println!("Loaded {} templates", registry.len());
        if registry.templates().iter().all(|t| t.frequency == 0) {
            println!("WARNING: {}: no template can ever be drawn", path);
            warnings += 1;
        }
    }

    println!("\nSummary: {} errors, {} warnings", errors, warnings);

    if errors == 0 {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn report(path: &str, diagnostics: &Diagnostics, verbose: bool, errors: &mut usize, warnings: &mut usize) {
    for diagnostic in diagnostics {
        match diagnostic.level {
            Level::Error => *errors += 1,
            Level::Warn => *warnings += 1,
            Level::Debug if !verbose => continue,
            Level::Debug => {}
        }
        println!("{}: {}", path, diagnostic);
    }
}

fn fail(path: &str, e: std::io::Error) -> ! {
    eprintln!("ERROR: Failed to read '{}': {}", path, e);
    process::exit(1);
}
