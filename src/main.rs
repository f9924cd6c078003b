mod cli;
mod io;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use radian_decoder_lib::ctc::{validate_posteriors, DEFAULT_ROW_TOLERANCE};
use radian_decoder_lib::{decode, decode_greedy, LanguageModel, TableModel};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(cli::Args::parse())
}

fn run(args: cli::Args) -> Result<()> {
    let config = args.decoder_config()?;
    log::info!(
        "Decoder config: beam_width={}, context_length={}, rna_threshold={}, signal_threshold={}, alphabet={}",
        config.beam_width,
        config.context_length,
        config.rna_entropy_threshold,
        config.signal_entropy_threshold,
        config.alphabet
    );

    let table = match &args.lm {
        Some(path) => {
            let table = TableModel::from_json_path(path)
                .with_context(|| format!("loading RNA model {}", path.display()))?;
            if table.context_length() != config.context_length {
                log::warn!(
                    "RNA model uses {}-mer contexts but context_length is {}; no context will be modeled",
                    table.context_length(),
                    config.context_length
                );
            }
            Some(table)
        }
        None => None,
    };
    let language_model = table.as_ref().map(|t| t as &dyn LanguageModel);
    if args.greedy && language_model.is_some() {
        log::warn!("Greedy decoding ignores the RNA model");
    }

    let batch = io::load_batch(&args.input)?;
    log::info!("Loaded {} reads from {}", batch.reads.len(), args.input.display());

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let channels = config.alphabet.chars().count() + 1;
    let start = Instant::now();
    let mut failures = 0usize;

    for read in &batch.reads {
        let result = read.to_array(channels).and_then(|posteriors| {
            let view = posteriors.view();
            if args.validate {
                validate_posteriors(&view, DEFAULT_ROW_TOLERANCE)?;
            }
            if args.greedy {
                decode_greedy(&view, &config)
            } else {
                decode(&view, &config, language_model)
            }
        });

        match result {
            Ok(decoded) => io::write_record(&mut out, &read.id, &decoded, args.fasta)?,
            Err(err) => {
                failures += 1;
                log::error!("Read {} failed: {} ({})", read.id, err, err.user_message());
            }
        }
    }
    out.flush()?;

    log::info!(
        "Decoded {} of {} reads in {:?}",
        batch.reads.len() - failures,
        batch.reads.len(),
        start.elapsed()
    );
    if failures > 0 {
        anyhow::bail!("{failures} reads failed to decode");
    }
    Ok(())
}
