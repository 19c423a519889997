use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, ValueHint};
use oxigraph::io::RdfFormat;
use rdf_transform::{
    ErrorPolicy, ExportConfig, RdfVisitor, RdfWriterSink, Row, RowSource, Table, Transform,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(about, version, name = "rdf-transform")]
/// Map a CSV table to RDF through a JSON transform
struct Args {
    /// Transform JSON, either the payload itself or a document holding it under "RDFTransform"
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    transform: PathBuf,
    /// CSV file with a header row
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    input: PathBuf,
    /// File to write to
    ///
    /// If no file is given, stdout is written.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
    /// Output format, an extension like "ttl" or a MIME type like "application/n-triples"
    ///
    /// By default the format is guessed from the output file extension, or Turtle on stdout.
    #[arg(short, long)]
    format: Option<String>,
    /// Maximum number of rows or records to visit, 0 for all
    #[arg(long, default_value_t = 0)]
    limit: usize,
    /// Buffered triple count that triggers a mid-row flush, 0 to disable
    #[arg(long, default_value_t = rdf_transform::DEFAULT_EXPORT_LIMIT)]
    export_limit: usize,
    /// Keep going when a root fails on a row, reporting what was skipped at the end
    #[arg(long)]
    skip_errors: bool,
    /// Build the triples in memory and report their count instead of writing them
    #[arg(long)]
    preview: bool,
    #[arg(long, default_value_t = 0)]
    project_id: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,rdf_transform=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let transform = read_transform(&args.transform)?;
    let table = read_table(&args.input)?;
    tracing::info!(
        rows = table.len(),
        records = table.has_records(),
        roots = transform.roots().len(),
        "Loaded {}",
        args.input.display()
    );

    let config = ExportConfig::default()
        .with_export_limit(args.export_limit)
        .with_item_limit(args.limit)
        .with_error_policy(if args.skip_errors {
            ErrorPolicy::SkipAndCollect
        } else {
            ErrorPolicy::FailFast
        });

    if args.preview {
        let mut visitor = RdfVisitor::preview(&transform, config).with_project(args.project_id);
        let summary = visitor.build_model(&table, 0)?;
        report_skipped(&summary.skipped);
        println!("{}", visitor.buffer().len());
        return Ok(());
    }

    let format = if let Some(format) = &args.format {
        rdf_format_from_name(format)?
    } else if let Some(file) = &args.output {
        rdf_format_from_path(file)?
    } else {
        RdfFormat::Turtle
    };

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = RdfWriterSink::new(format, writer);

    let summary = RdfVisitor::new(&transform, &mut sink, config)
        .with_project(args.project_id)
        .build_model(&table, 0)
        .context("Transform failed")?;
    report_skipped(&summary.skipped);

    let written = sink.written();
    let mut writer = sink.finish().context("Finishing output")?;
    writer.flush()?;
    tracing::info!(
        triples = written,
        flushes = summary.flushes,
        "Wrote {} items",
        summary.items_visited
    );
    Ok(())
}

fn read_transform(path: &Path) -> anyhow::Result<Transform> {
    let file = File::open(path).with_context(|| format!("Opening {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Parsing {}", path.display()))?;

    Transform::from_payload_or_document(&document)
        .with_context(|| format!("Reading transform from {}", path.display()))
}

fn read_table(path: &Path) -> anyhow::Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Opening {}", path.display()))?;

    let mut table = Table::new(reader.headers()?.iter());
    for record in reader.records() {
        let record = record.with_context(|| format!("Reading {}", path.display()))?;
        table.push_row(Row::from_values(record.iter()));
    }
    Ok(table)
}

fn report_skipped(skipped: &[rdf_transform::SkippedItem]) {
    for item in skipped {
        tracing::warn!("Skipped {} (root {}): {}", item.location, item.root, item.error);
    }
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    };
    RdfFormat::from_extension(ext)
        .with_context(|| format!("The file extension '{ext}' is unknown"))
}

fn rdf_format_from_name(name: &str) -> anyhow::Result<RdfFormat> {
    if let Some(format) = RdfFormat::from_extension(name) {
        return Ok(format);
    }
    if let Some(format) = RdfFormat::from_media_type(name) {
        return Ok(format);
    }
    bail!("The file format '{name}' is unknown")
}
