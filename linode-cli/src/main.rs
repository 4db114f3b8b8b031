use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use env_logger::Builder;
use log::{LevelFilter, debug};
use tokio_util::sync::CancellationToken;

use linode_core::diagnostics::{Diagnostics, Severity};
use linode_core::provider::DataSource;
use linode_core::resource::{ResourceId, State, Value};
use linode_core::schema::{AttributeSchema, BlockNesting, BlockSchema};
use linode_provider::{InMemoryApi, LinodeProvider, ProviderConfig};

#[derive(Parser)]
#[command(name = "linode")]
#[command(about = "Inspect and read Linode list data sources", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available data sources
    DataSources,
    /// Show the schema of a data source
    Schema {
        /// Data source type (e.g. linode_images)
        data_source: String,
    },
    /// Validate a query document against a data source
    Validate {
        data_source: String,
        /// JSON query document ({"filter": [...], "order": ..., "order_by": ...})
        file: PathBuf,
    },
    /// Show the id, X-Filter header and local filters of a query
    Plan {
        data_source: String,
        file: PathBuf,
    },
    /// Read a data source
    Read {
        data_source: String,
        file: PathBuf,

        /// Serve list endpoints from a JSON fixture instead of the live API
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Name of the read in log output
        #[arg(long, default_value = "cli")]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::DataSources => Ok(run_data_sources(&offline_provider())),
        Commands::Schema { data_source } => run_schema(&offline_provider(), &data_source),
        Commands::Validate { data_source, file } => {
            run_validate(&offline_provider(), &data_source, &file)
        }
        Commands::Plan { data_source, file } => run_plan(&offline_provider(), &data_source, &file),
        Commands::Read {
            data_source,
            file,
            fixture,
            name,
        } => run_read(&data_source, &file, fixture.as_deref(), &name).await,
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_logger(verbose: u8) {
    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            Builder::from_default_env().init();
        }
        None => {
            let level = match verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                _ => LevelFilter::Debug,
            };
            Builder::new().filter_level(level).init();
        }
    }
}

/// Provider for commands that never reach the API
fn offline_provider() -> LinodeProvider {
    LinodeProvider::new(Arc::new(InMemoryApi::new()))
}

fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

/// Load a query document as data source configuration
fn load_query(path: &Path) -> Result<HashMap<String, Value>, String> {
    match Value::from_json(&read_json(path)?) {
        Value::Map(config) => Ok(config),
        _ => Err(format!("{}: query document must be a JSON object", path.display())),
    }
}

fn format_diagnostics(diags: &Diagnostics) -> String {
    diags
        .iter()
        .map(|d| match d.severity {
            Severity::Error => format!("  {} {}", "✗".red(), d),
            Severity::Warning => format!("  {} {}", "!".yellow(), d),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Commands
// =============================================================================

fn run_data_sources(provider: &LinodeProvider) -> String {
    provider.data_source_names().join("\n")
}

fn run_schema(provider: &LinodeProvider, name: &str) -> Result<String, String> {
    let ds = provider.list_data_source(name).map_err(|e| e.to_string())?;
    let schema = ds.schema();

    let mut lines = vec![schema.resource_type.bold().to_string()];
    if let Some(description) = &schema.description {
        lines.push(format!("  {}", description));
    }
    for attr in schema.attributes.values() {
        lines.push(format_attribute(attr, 1));
    }
    for block in schema.blocks.values() {
        format_block(block, 1, &mut lines);
    }
    Ok(lines.join("\n"))
}

fn format_attribute(attr: &AttributeSchema, depth: usize) -> String {
    let mode = if attr.required {
        "required"
    } else if attr.computed {
        "computed"
    } else {
        "optional"
    };
    let mut line = format!(
        "{}{} ({}, {})",
        "  ".repeat(depth),
        attr.name.cyan(),
        attr.attr_type,
        mode
    );
    if let Some(description) = &attr.description {
        line.push_str(&format!(" - {}", description));
    }
    line
}

fn format_block(block: &BlockSchema, depth: usize, lines: &mut Vec<String>) {
    let nesting = match block.nesting {
        BlockNesting::List => "list",
        BlockNesting::Set => "set",
    };
    let mode = if block.computed { "computed" } else { "optional" };
    lines.push(format!(
        "{}{} {{}} ({} block, {})",
        "  ".repeat(depth),
        block.name.green(),
        nesting,
        mode
    ));
    for attr in block.attributes.values() {
        lines.push(format_attribute(attr, depth + 1));
    }
    for nested in block.blocks.values() {
        format_block(nested, depth + 1, lines);
    }
}

fn run_validate(provider: &LinodeProvider, name: &str, file: &Path) -> Result<String, String> {
    let ds = provider.list_data_source(name).map_err(|e| e.to_string())?;
    let config = load_query(file)?;

    let diags = ds.validate(&config);
    if diags.has_error() {
        return Err(format!(
            "{} is not valid for {}:\n{}",
            file.display(),
            name,
            format_diagnostics(&diags)
        ));
    }

    let mut output = format!("{} {} is valid for {}", "✓".green(), file.display(), name);
    if !diags.is_empty() {
        output.push('\n');
        output.push_str(&format_diagnostics(&diags));
    }
    Ok(output)
}

fn run_plan(provider: &LinodeProvider, name: &str, file: &Path) -> Result<String, String> {
    let ds = provider.list_data_source(name).map_err(|e| e.to_string())?;
    let config = load_query(file)?;

    let plan = ds
        .plan(&config)
        .map_err(|diags| format!("Plan failed:\n{}", format_diagnostics(&diags)))?;

    let local = if plan.local_filters.is_empty() {
        "(none)".to_string()
    } else {
        plan.local_filters.join(", ")
    };
    Ok(format!(
        "{} {}\n{} {}\n{} {}\n{} {}",
        "id:".bold(),
        plan.id,
        "X-Filter:".bold(),
        plan.filter,
        "local filters:".bold(),
        local,
        "latest:".bold(),
        plan.latest
    ))
}

/// Serialise a read result, computed attributes included
fn state_to_json(state: &State) -> serde_json::Value {
    serde_json::Value::Object(
        state
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}

async fn run_read(
    name: &str,
    file: &Path,
    fixture: Option<&Path>,
    read_name: &str,
) -> Result<String, String> {
    let provider = match fixture {
        Some(path) => {
            let api = InMemoryApi::from_fixture(&read_json(path)?)
                .map_err(|e| format!("Invalid fixture {}: {}", path.display(), e))?;
            debug!("Reading {} from fixture {}", name, path.display());
            LinodeProvider::new(Arc::new(api))
        }
        None => {
            let config = ProviderConfig::from_attributes(&HashMap::new()).map_err(|e| e.to_string())?;
            LinodeProvider::from_config(&config).map_err(|e| e.to_string())?
        }
    };
    let config = load_query(file)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let state = read_state(&provider, name, read_name, &config, &cancel).await?;
    serde_json::to_string_pretty(&state_to_json(&state)).map_err(|e| e.to_string())
}

async fn read_state(
    provider: &LinodeProvider,
    name: &str,
    read_name: &str,
    config: &HashMap<String, Value>,
    cancel: &CancellationToken,
) -> Result<State, String> {
    let ds = provider.list_data_source(name).map_err(|e| e.to_string())?;
    ds.read(&ResourceId::new(name, read_name), config, cancel)
        .await
        .map_err(|diags| format!("Read failed:\n{}", format_diagnostics(&diags)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_read_with_fixture() {
        let cli = Cli::try_parse_from([
            "linode",
            "-vv",
            "read",
            "linode_regions",
            "query.json",
            "--fixture",
            "fixture.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Read {
                data_source,
                fixture,
                name,
                ..
            } => {
                assert_eq!(data_source, "linode_regions");
                assert_eq!(fixture, Some(PathBuf::from("fixture.json")));
                assert_eq!(name, "cli");
            }
            _ => panic!("expected read"),
        }
    }

    #[test]
    fn rejects_missing_query_file_argument() {
        assert!(Cli::try_parse_from(["linode", "plan", "linode_images"]).is_err());
    }

    #[test]
    fn data_sources_are_listed() {
        let output = run_data_sources(&offline_provider());
        assert!(output.lines().any(|l| l == "linode_images"));
        assert_eq!(output.lines().count(), 10);
    }

    #[test]
    fn schema_shows_filter_block() {
        colored::control::set_override(false);
        let output = run_schema(&offline_provider(), "linode_volumes").unwrap();
        assert!(output.contains("filter {} (set block, optional)"));
        assert!(output.contains("name (String, required)"));
        assert!(output.contains("volumes {} (list block, computed)"));
    }

    #[test]
    fn schema_of_unknown_data_source() {
        let err = run_schema(&offline_provider(), "linode_nope").unwrap_err();
        assert!(err.contains("Known data sources"));
    }

    #[test]
    fn plan_prints_the_filter_header() {
        colored::control::set_override(false);
        let query = write_json(
            r#"{"filter": [{"name": "engine", "values": ["mysql", "postgresql"]}],
                "order": "asc", "order_by": "engine"}"#,
        );
        let output = run_plan(&offline_provider(), "linode_database_engines", query.path()).unwrap();
        assert!(output.contains(
            r#"X-Filter: {"+and":[{"+or":[{"engine":"mysql"},{"engine":"postgresql"}]}],"+order":"asc","+order_by":"engine"}"#
        ));
        assert!(output.contains("local filters: (none)"));
    }

    #[test]
    fn validate_reports_unknown_fields() {
        let query = write_json(r#"{"filter": [{"name": "bogus", "values": ["x"]}]}"#);
        let err = run_validate(&offline_provider(), "linode_regions", query.path()).unwrap_err();
        assert!(err.contains("\"bogus\" is not a filterable field"));
    }

    #[test]
    fn query_must_be_an_object() {
        let query = write_json("[1, 2]");
        let err = load_query(query.path()).unwrap_err();
        assert!(err.ends_with("query document must be a JSON object"));
    }

    #[tokio::test]
    async fn read_from_fixture() {
        let fixture = write_json(
            r#"{"regions": [
                {"id": "us-east", "label": "Newark, NJ", "country": "us", "status": "ok"},
                {"id": "eu-west", "label": "London, UK", "country": "gb", "status": "ok"}
            ]}"#,
        );
        let query = write_json(r#"{"filter": [{"name": "id", "values": ["^eu-"], "match_by": "re"}]}"#);

        let output = run_read("linode_regions", query.path(), Some(fixture.path()), "test")
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["regions"][0]["id"], "eu-west");
        assert_eq!(json["regions"].as_array().unwrap().len(), 1);
        assert_eq!(json["id"].as_str().unwrap().len(), 64);
    }
}
