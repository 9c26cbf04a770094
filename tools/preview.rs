/// Preview: interactive generation shell for testing dictionaries and corpora.
///
/// Usage: preview --dictionary <path> --rules <path> --corpus <path>
///                [--config <path>] [--seed <n>]
///
/// Commands:
///   sentence [n]      draw n sentences (default 1)
///   poem              compose a poem with the configured layout
///   write <template>  resolve one template with a fresh subject
///   subject           show the current subject
///   clear             forget the current subject
///   seed <n>          rebuild with a new RNG seed
///   help              list commands
///   quit              exit

use sentence_engine::core::pipeline::SentenceGenerator;
use sentence_engine::core::verse::compose_poem;
use sentence_engine::Level;
use std::io::{self, BufRead, Write};
use std::process;

#[derive(Default, Clone)]
struct Paths {
    dictionary: Option<String>,
    rules: Option<String>,
    corpus: Option<String>,
    config: Option<String>,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut paths = Paths::default();
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dictionary" if i + 1 < args.len() => {
                i += 1;
                paths.dictionary = Some(args[i].clone());
            }
            "--rules" if i + 1 < args.len() => {
                i += 1;
                paths.rules = Some(args[i].clone());
            }
            "--corpus" if i + 1 < args.len() => {
                i += 1;
                paths.corpus = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                paths.config = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut generator = match build_generator(&paths, seed) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    report_load(&generator);
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        match cmd.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "sentence" | "s" => {
                let count: usize = rest.trim().parse().unwrap_or(1);
                for _ in 0..count {
                    match generator.draw_sentence() {
                        Ok(text) => println!("{}", text),
                        Err(e) => {
                            println!("ERROR: {}", e);
                            break;
                        }
                    }
                }
            }
            "poem" | "p" => match compose_poem(&mut generator) {
                Ok(poem) => {
                    println!("\n{}\n", poem);
                }
                Err(e) => println!("ERROR: {}", e),
            },
            "write" | "w" => {
                if rest.trim().is_empty() {
                    println!("Usage: write <template>");
                    continue;
                }
                match generator.write(rest.trim()) {
                    Ok(text) => println!("{}", text),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "subject" => match generator.subject() {
                Some(subject) => println!("Subject: {}", subject),
                None => println!("No subject."),
            },
            "clear" => {
                generator.clear_subject();
                println!("Subject cleared.");
            }
            "seed" => match rest.trim().parse::<u64>() {
                Ok(n) => match build_generator(&paths, n) {
                    Ok(g) => {
                        generator = g;
                        println!("Seed set to {}", n);
                    }
                    Err(e) => println!("ERROR: {}", e),
                },
                Err(_) => println!("Usage: seed <n>"),
            },
            other => println!("Unknown command: {} (type 'help')", other),
        }
    }
}

fn build_generator(
    paths: &Paths,
    seed: u64,
) -> Result<SentenceGenerator, sentence_engine::GeneratorError> {
    let mut builder = SentenceGenerator::builder().seed(seed);
    if let Some(ref path) = paths.dictionary {
        builder = builder.dictionary_path(path);
    }
    if let Some(ref path) = paths.rules {
        builder = builder.rules_path(path);
    }
    if let Some(ref path) = paths.corpus {
        builder = builder.corpus_path(path);
    }
    if let Some(ref path) = paths.config {
        builder = builder.config_path(path);
    }
    builder.build()
}

fn report_load(generator: &SentenceGenerator) {
    for diagnostic in generator.load_diagnostics() {
        if diagnostic.level >= Level::Warn {
            println!("{}", diagnostic);
        }
    }
    println!(
        "Loaded {} words, {} rules, {} templates",
        generator.lexicon().len(),
        generator.rules().len(),
        generator.registry().len()
    );
}

fn print_usage() {
    println!("Usage: preview --dictionary <path> --rules <path> --corpus <path> [--config <path>] [--seed <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  sentence [n]      draw n sentences (default 1)");
    println!("  poem              compose a poem with the configured layout");
    println!("  write <template>  resolve one template, e.g. write ${{SUBJ}} ${{VERB}}.");
    println!("  subject           show the current subject");
    println!("  clear             forget the current subject");
    println!("  seed <n>          rebuild with a new RNG seed");
    println!("  help              this list");
    println!("  quit              exit");
}
