//! Command-line sentence generator: a grammar file and a word list in,
//! random sentences on stdout.

use anyhow::{Context, Result};
use babble_lib::{Graph, Lexicon};
use clap::Parser;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Generate random sentences from a probabilistic grammar."
)]
struct Cli {
    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Number of sentences to generate
    #[arg(short, long, default_value_t = 10)]
    number: u32,

    /// Seed for the random number generator (defaults to OS entropy)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Plain text file containing the grammar in simple BNF form
    grammar_file: PathBuf,

    /// Word list for all grammar terminals, as a JSON object
    words_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(if cli.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_timestamp(None)
        .init();

    let grammar = fs::read_to_string(&cli.grammar_file)
        .with_context(|| format!("cannot read grammar file `{}`", cli.grammar_file.display()))?;
    let graph: Graph = grammar
        .parse()
        .with_context(|| format!("invalid grammar in `{}`", cli.grammar_file.display()))?;
    debug!("graph:\n{}", graph);

    let words = fs::read_to_string(&cli.words_file)
        .with_context(|| format!("cannot read word list `{}`", cli.words_file.display()))?;
    let mut lexicon = Lexicon::from_json(&words)
        .with_context(|| format!("invalid word list in `{}`", cli.words_file.display()))?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    for _ in 0..cli.number {
        let symbols = graph.traverse_with(&mut rng);
        debug!("abstract sentence: {:?}", symbols);
        let words = lexicon.realize_with(&symbols, &mut rng)?;
        println!("{}.", words.join(" "));
    }

    Ok(())
}
