//! Command-line interface for the harvester.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::HarvesterConfig;
use crate::cursor::PageCursor;
use crate::error::Result;
use crate::harvester::Harvester;
use crate::source::SourceAdapter;
use crate::temporal::parse_utc;
use crate::types::{Metadata, RecordFilter};

/// Metaharvest - harvest research metadata from a registry API or a repository database.
#[derive(Parser)]
#[command(name = "metaharvest-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file (default: environment variables)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Backend to harvest from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Source {
    #[default]
    Registry,
    Repository,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Print the full XML document of each record
    #[arg(long)]
    pub xml: bool,

    /// Print each record as one JSON line
    #[arg(long, conflicts_with = "xml")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List one page of records.
    ListRecords {
        #[arg(short, long, value_enum, default_value_t = Source::Registry)]
        source: Source,

        /// Free-text query in the registry query language
        #[arg(short, long)]
        query: Option<String>,

        /// Set spec restricting the listing
        #[arg(long)]
        set: Option<String>,

        /// Lower bound on the updated timestamp (inclusive)
        #[arg(long)]
        from: Option<String>,

        /// Upper bound on the updated timestamp (exclusive)
        #[arg(long)]
        until: Option<String>,

        /// Cursor returned by a previous call
        #[arg(long)]
        cursor: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch a single record by identifier.
    GetRecord {
        /// DOI for the registry, numeric record id for the repository
        identifier: String,

        #[arg(short, long, value_enum, default_value_t = Source::Registry)]
        source: Source,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the sets records can be filtered by.
    ListSets {
        #[arg(short, long, value_enum, default_value_t = Source::Registry)]
        source: Source,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => HarvesterConfig::from_yaml_file(path)?,
        None => HarvesterConfig::from_env()?,
    };

    match cli.command {
        Commands::ListRecords {
            source,
            query,
            set,
            from,
            until,
            cursor,
            output,
        } => {
            let mut filter = RecordFilter::default().with_range(
                from.as_deref().map(parse_utc).transpose()?,
                until.as_deref().map(parse_utc).transpose()?,
            );
            filter.query = query;
            filter.set = set;

            match source {
                Source::Registry => list_records_command(
                    &Harvester::registry(&config)?,
                    &filter,
                    cursor.as_deref(),
                    &output,
                ),
                Source::Repository => list_records_command(
                    &Harvester::repository(&config)?,
                    &filter,
                    cursor.as_deref(),
                    &output,
                ),
            }
        }
        Commands::GetRecord {
            identifier,
            source,
            output,
        } => match source {
            Source::Registry => get_record_command(&Harvester::registry(&config)?, &identifier, &output),
            Source::Repository => {
                get_record_command(&Harvester::repository(&config)?, &identifier, &output)
            }
        },
        Commands::ListSets { source } => match source {
            Source::Registry => list_sets_command(&Harvester::registry(&config)?),
            Source::Repository => list_sets_command(&Harvester::repository(&config)?),
        },
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Execute the list-records command.
fn list_records_command<A: SourceAdapter>(
    harvester: &Harvester<A>,
    filter: &RecordFilter,
    cursor: Option<&str>,
    output: &OutputArgs,
) -> Result<()> {
    let cursor = match cursor {
        Some(raw) => raw.parse::<A::Cursor>()?,
        None => A::Cursor::start(),
    };

    let pb = spinner("Fetching records...");
    let page = harvester.list_records(filter, &cursor);
    pb.finish_and_clear();
    let page = page?;

    if page.is_no_match() {
        println!("{}", style("No records match the query").yellow());
        return Ok(());
    }

    for record in &page.records {
        print_record(record, output)?;
    }

    if !output.json {
        println!();
        println!("  Records: {}", page.records.len());
        if let Some(total) = page.total {
            println!("  Total: {total}");
        }
        match &page.next_cursor {
            Some(next) if !next.is_exhausted() => {
                println!("  Next cursor: {}", style(next).cyan());
            }
            _ => println!("  {}", style("End of listing").green()),
        }
    }
    Ok(())
}

/// Execute the get-record command.
fn get_record_command<A: SourceAdapter>(
    harvester: &Harvester<A>,
    identifier: &str,
    output: &OutputArgs,
) -> Result<()> {
    let pb = spinner("Fetching record...");
    let record = harvester.get_record(identifier);
    pb.finish_and_clear();

    match record? {
        Some(record) => print_record(&record, output),
        None => {
            println!("{} {}", style("Not found:").yellow().bold(), identifier);
            Ok(())
        }
    }
}

/// Execute the list-sets command.
fn list_sets_command<A: SourceAdapter>(harvester: &Harvester<A>) -> Result<()> {
    let pb = spinner("Fetching sets...");
    let sets = harvester.list_sets();
    pb.finish_and_clear();

    for set in sets? {
        println!("{}  {}", style(&set.spec).cyan(), set.name);
    }
    Ok(())
}

fn print_record(record: &Metadata, output: &OutputArgs) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string(record)?);
        return Ok(());
    }

    let title = record.titles.first().map(String::as_str).unwrap_or_default();
    let status = if record.active {
        style("active").green()
    } else {
        style("inactive").yellow()
    };
    println!(
        "{} {} [{}] {}",
        style(&record.identifier).cyan().bold(),
        record.updated_datetime,
        status,
        title
    );

    if output.xml {
        match record.xml_str() {
            Some(xml) => println!("{xml}"),
            None => println!("  {}", style("(no XML)").dim()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_list_records_defaults() {
        let cli = Cli::parse_from(["metaharvest-harvester", "list-records"]);

        let Commands::ListRecords {
            source,
            query,
            cursor,
            output,
            ..
        } = cli.command
        else {
            panic!("expected list-records");
        };
        assert_eq!(source, Source::Registry);
        assert!(query.is_none());
        assert!(cursor.is_none());
        assert!(!output.xml && !output.json);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_list_records_repository() {
        let cli = Cli::parse_from([
            "metaharvest-harvester",
            "list-records",
            "--source",
            "repository",
            "--set",
            "openaire_data",
            "--from",
            "2020-01-01",
            "--cursor",
            "50",
            "--json",
        ]);

        let Commands::ListRecords {
            source,
            set,
            from,
            cursor,
            output,
            ..
        } = cli.command
        else {
            panic!("expected list-records");
        };
        assert_eq!(source, Source::Repository);
        assert_eq!(set.as_deref(), Some("openaire_data"));
        assert_eq!(from.as_deref(), Some("2020-01-01"));
        assert_eq!(cursor.as_deref(), Some("50"));
        assert!(output.json);
    }

    #[test]
    fn test_cli_parse_get_record_with_config() {
        let cli = Cli::parse_from([
            "metaharvest-harvester",
            "get-record",
            "10.5072/abc",
            "--config",
            "harvester.yaml",
            "--xml",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("harvester.yaml")));
        let Commands::GetRecord {
            identifier, output, ..
        } = cli.command
        else {
            panic!("expected get-record");
        };
        assert_eq!(identifier, "10.5072/abc");
        assert!(output.xml);
    }

    #[test]
    fn test_cli_rejects_xml_and_json_together() {
        let result = Cli::try_parse_from([
            "metaharvest-harvester",
            "list-records",
            "--xml",
            "--json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_list_sets() {
        let cli = Cli::parse_from(["metaharvest-harvester", "list-sets", "-s", "repository"]);
        assert!(matches!(
            cli.command,
            Commands::ListSets {
                source: Source::Repository
            }
        ));
    }
}
