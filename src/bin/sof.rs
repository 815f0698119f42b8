//! `sof` — the command-line entry point. Thin: parses arguments, wires the
//! real `StdIo`, and renders any uncaught `SofError` the way spec.md §7
//! describes (kind header, file/line, caret excerpt, message).

use anyhow::{Context, Result};
use clap::Parser as _;
use sof::cli::Cli;
use sof::error::SofError;
use sof::interpreter::Interpreter;
use sof::io::StdIo;
use sof::location::FileTag;
use sof::parser::Parser;
use sof::preamble;
use sof::preprocessor::preprocess;
use sof::render;
use sof::tokenizer::Tokenizer;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("sof {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if cli.debug {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_writer(std::io::stderr)
            .init();
    }

    let (source, file) = read_program(&cli)?;

    let cleaned = if cli.skip_preprocess {
        source.clone()
    } else {
        match preprocess(&source, file.clone()) {
            Ok(cleaned) => cleaned,
            Err(err) => return fail(&err, &source),
        }
    };

    if cli.preprocess_only {
        print!("{}", cleaned);
        return Ok(());
    }

    let tokenizer = Tokenizer::new(cleaned.clone(), file.clone());
    let list = match Parser::new(tokenizer).parse() {
        Ok(list) => list,
        Err(err) => return fail(&err, &cleaned),
    };

    let mut interp = Interpreter::new(Box::new(StdIo));
    if let Err(err) = preamble::install(&mut interp) {
        return fail(&err, &cleaned);
    }

    match interp.run(&list, file, &cleaned) {
        Ok(()) => Ok(()),
        Err(err) => fail(&err, &cleaned),
    }
}

fn read_program(cli: &Cli) -> Result<(String, FileTag)> {
    if let Some(command) = &cli.command {
        return Ok((command.clone(), FileTag::Synthetic("<command>")));
    }
    if cli.files.is_empty() {
        anyhow::bail!("no program given: pass -c COMMAND or one or more source files");
    }
    let mut combined = String::new();
    for path in &cli.files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading '{}'", path.display()))?;
        combined.push_str(&text);
        combined.push('\n');
    }
    let tag = FileTag::Real(PathBuf::from(&cli.files[0]));
    Ok((combined, tag))
}

/// Prints an uncaught `SofError`'s report (spec.md §7) and exits non-zero.
fn fail(err: &SofError, source: &str) -> Result<()> {
    eprint!("{}", render::report(err, source));
    std::process::exit(1);
}
