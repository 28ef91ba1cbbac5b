pub mod aggregate;
pub mod binning;
pub mod chart;
pub mod cli;
pub mod continent;
pub mod extract;
pub mod frame;
pub mod gender;
pub mod io_utils;
pub mod metadata;
pub mod pipeline;
pub mod schema;
pub mod table;
pub mod tidy;
pub mod units;

use std::{env, fs, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{ChartArgs, Cli, Commands, QuestionsArgs, TidyArgs},
    frame::SurveyFrame,
    gender::GenderCache,
    metadata::MetadataStore,
    pipeline::QuestionOutcome,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("survey_tidy", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Questions(args) => handle_questions(&args),
        Commands::Tidy(args) => handle_tidy(&args),
        Commands::Chart(args) => handle_chart(&args),
    }
}

fn load_store(meta: Option<&std::path::Path>) -> Result<MetadataStore> {
    let mut store = MetadataStore::builtin();
    if let Some(path) = meta {
        store
            .load_overrides(path)
            .with_context(|| format!("Loading metadata overrides from {path:?}"))?;
    }
    Ok(store)
}

fn handle_questions(args: &QuestionsArgs) -> Result<()> {
    let store = load_store(args.meta.as_deref())?;
    let headers = vec![
        "question".to_string(),
        "format".to_string(),
        "plot".to_string(),
        "anchor".to_string(),
        "values".to_string(),
        "rows".to_string(),
        "subs".to_string(),
        "binning".to_string(),
    ];
    let mut rows = Vec::new();
    for id in store.question_ids() {
        let meta = store.get(&id);
        rows.push(vec![
            id,
            format!("{:?}", meta.column_format()),
            format!("{:?}", meta.plot_type),
            format!("{:?}", meta.anchor),
            meta.value_map.len().to_string(),
            meta.row_map.len().to_string(),
            meta.sub_map.len().to_string(),
            (if meta.binning.is_some() { "fixed" } else { "" }).to_string(),
        ]);
    }
    table::print_table(&headers, &rows);
    info!("Listed {} configured question(s)", rows.len());
    Ok(())
}

fn load_frame(
    input: &std::path::Path,
    delimiter: Option<u8>,
    encoding: Option<&str>,
    respondent_column: &str,
) -> Result<SurveyFrame> {
    let delimiter = io_utils::resolve_input_delimiter(input, delimiter);
    let encoding = io_utils::resolve_encoding(encoding)?;
    SurveyFrame::load(input, delimiter, encoding, respondent_column)
        .with_context(|| format!("Loading survey export {input:?}"))
}

fn handle_tidy(args: &TidyArgs) -> Result<()> {
    let store = load_store(args.meta.as_deref())?;
    let frame = load_frame(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
        &args.respondent_column,
    )?;
    let meta = store.get(&args.question);
    let extraction = extract::extract(&args.question, &frame);
    let mut cache = GenderCache::new();
    let records = tidy::build_tidy(
        &frame,
        &args.question,
        &meta,
        &extraction,
        &store,
        &mut cache,
        args.reference_year,
    );
    if records.is_empty() {
        info!("Question '{}' has no decodable responses", args.question);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.respondent_id.clone(),
                r.group.clone().unwrap_or_default(),
                r.value.to_string(),
            ]
        })
        .collect();
    let headers = vec![
        "respondent".to_string(),
        "group".to_string(),
        "value".to_string(),
    ];
    match &args.output {
        Some(path) => {
            let mut writer = io_utils::open_csv_writer(Some(path.as_path()), b',')?;
            writer.write_record(&headers)?;
            for row in &rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
            info!(
                "Wrote {} tidy record(s) for '{}' to {:?}",
                rows.len(),
                args.question,
                path
            );
        }
        None => {
            table::print_table(&headers, &rows);
            info!("Decoded {} tidy record(s) for '{}'", rows.len(), args.question);
        }
    }
    Ok(())
}

fn handle_chart(args: &ChartArgs) -> Result<()> {
    let store = load_store(args.meta.as_deref())?;
    let frame = load_frame(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
        &args.respondent_column,
    )?;
    let mut cache = GenderCache::new();

    let outcomes = match &args.question {
        Some(question) => {
            let outcome =
                pipeline::run_question(&frame, &store, &mut cache, question, args.reference_year)
                    .with_context(|| format!("Processing question '{question}'"))?;
            vec![(question.clone(), outcome)]
        }
        None => pipeline::run_all(&frame, &store, &mut cache, args.reference_year),
    };

    let mut emitted = 0usize;
    for (question, outcome) in &outcomes {
        let QuestionOutcome::Chart(spec) = outcome else {
            continue;
        };
        match &args.output_dir {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Creating output directory {dir:?}"))?;
                let path = dir.join(format!("{question}.json"));
                let json = serde_json::to_string_pretty(spec)?;
                fs::write(&path, json)
                    .with_context(|| format!("Writing chart spec to {path:?}"))?;
            }
            None => {
                println!("{}", serde_json::to_string_pretty(spec)?);
            }
        }
        emitted += 1;
    }
    info!(
        "Emitted {emitted} chart spec(s) out of {} question(s)",
        outcomes.len()
    );
    Ok(())
}
