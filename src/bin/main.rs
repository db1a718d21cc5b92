//! OAI-PMH Record Assembly CLI
//!
//! Command-line tool for assembling metadata records from flat query
//! rows and inspecting the registered metadata formats.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use oai_assemble::{
    assemble, encode_document, AssembleError, AssembleRequest, FieldMappings, FormatRegistry,
    SourceRow,
};

#[derive(Parser)]
#[command(name = "oai-assemble")]
#[command(about = "Assemble flat query rows into hierarchical OAI-PMH metadata records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble records from a JSON row file
    Assemble(AssembleArgs),
    /// List the registered metadata formats
    Formats(FormatsArgs),
}

#[derive(Args)]
struct AssembleArgs {
    /// JSON file with query rows: [{"id": "...", "fields": {"alias": "value", ...}}, ...]
    input: PathBuf,

    /// Metadata format to render records in
    #[arg(short, long, default_value = "oai_dc")]
    format: String,

    /// Format ids to advertise alongside the records (defaults to the
    /// rendered format). Can be repeated.
    #[arg(long = "enable", value_name = "FORMAT_ID")]
    enabled: Vec<String>,

    /// JSON file with field mappings: {"<format_id>": {"<field_id>": "<alias>", ...}, ...}
    #[arg(short, long)]
    mappings: Option<PathBuf>,

    /// Directory to write one XML file per entity (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Indent XML output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct FormatsArgs {
    /// Also list each format's element aliases
    #[arg(long)]
    elements: bool,
}

fn run_assemble(args: AssembleArgs) -> Result<(), AssembleError> {
    let rows: Vec<SourceRow> = serde_json::from_str(&fs::read_to_string(&args.input)?)?;

    let mappings = match &args.mappings {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => FieldMappings::new(),
    };

    let request = AssembleRequest {
        enabled_formats: if args.enabled.is_empty() {
            vec![args.format.clone()]
        } else {
            args.enabled.clone()
        },
        format_id: args.format,
    };

    let registry = FormatRegistry::with_defaults();
    let result = assemble(&rows, &registry, &mappings, &request)?;

    for (entity_id, document) in &result.records {
        let xml = encode_document(document, args.pretty)?;
        match &args.output {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                fs::write(dir.join(format!("{}.xml", sanitize_id(entity_id))), xml)?;
            }
            None => println!("{xml}"),
        }
    }

    for diagnostic in &result.diagnostics {
        eprintln!("warning: {diagnostic}");
    }
    eprintln!(
        "Assembled {} records from {} rows ({} merged, {} skipped)",
        result.stats.entities_out,
        result.stats.rows_in,
        result.stats.rows_merged,
        result.stats.rows_skipped
    );

    Ok(())
}

fn run_formats(args: FormatsArgs) -> Result<(), AssembleError> {
    let registry = FormatRegistry::with_defaults();

    for id in registry.ids() {
        let format = match registry.get(id) {
            Some(format) => format,
            None => continue,
        };
        println!("{id}: {} (root <{}>)", format.label(), format.root_tag());
        println!("  schema:    {}", format.schema_url());
        println!("  namespace: {}", format.namespace_uri());

        if args.elements {
            for (alias, label) in format.element_options() {
                println!("  {alias:<28} {label}");
            }
        }
    }

    Ok(())
}

/// Make an entity id safe to use as a file name.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Assemble(args) => run_assemble(args),
        Commands::Formats(args) => run_formats(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
