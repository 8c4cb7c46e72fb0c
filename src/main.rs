use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use survey_sheets::{data::load_workbook, load_sheet, parse_tree, Config};

#[derive(Parser, Debug)]
#[command(name = "survey-sheets")]
#[command(about = "Builds the question tree JSON from a survey spreadsheet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the sheets of a workbook
    Sheets {
        /// Spreadsheet (.xlsx, .xls, .ods, ...) or JSON workbook
        input: PathBuf,
    },
    /// Convert a sheet into the question tree
    Convert {
        #[command(flatten)]
        source: Source,
        /// Output file, `<sheet>.json` by default
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the first N questions of the result
        #[arg(long, value_name = "N")]
        preview: Option<usize>,
    },
    /// Re-apply prompt texts from a sheet onto an existing question tree
    Transfer {
        #[command(flatten)]
        source: Source,
        /// Previously generated question tree
        #[arg(long)]
        json: PathBuf,
        /// Output file, `<json stem>_updated.json` by default
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare the question ids of a sheet and a question tree
    Validate {
        #[command(flatten)]
        source: Source,
        /// Previously generated question tree
        #[arg(long)]
        json: PathBuf,
    },
}

#[derive(Args, Debug)]
struct Source {
    /// Spreadsheet (.xlsx, .xls, .ods, ...) or JSON workbook
    input: PathBuf,
    /// Sheet to read, the first one by default
    #[arg(short, long)]
    sheet: Option<String>,
    /// JSON file overriding column names
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Source {
    fn load(&self) -> Result<(survey_sheets::Sheet, Config)> {
        let config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Cannot load config '{}'", path.display()))?,
            None => Config::default(),
        };
        let sheet = load_sheet(&self.input, self.sheet.as_deref())
            .with_context(|| format!("Cannot read '{}'", self.input.display()))?;
        Ok((sheet, config))
    }
}

fn read_tree(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    parse_tree(&text).with_context(|| format!("Invalid question tree '{}'", path.display()))
}

fn write_json(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("Cannot write '{}'", path.display()))?;
    println!("Saved {}", path.display());
    Ok(())
}

fn print_warnings(warnings: &[String]) {
    if !warnings.is_empty() {
        println!("Warnings:");
        for w in warnings {
            println!("  {w}");
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("survey_sheets=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Sheets { input } => {
            let workbook = load_workbook(&input)
                .with_context(|| format!("Cannot read '{}'", input.display()))?;
            for name in workbook.sheet_names() {
                println!("{name}");
            }
        }
        Commands::Convert {
            source,
            output,
            preview,
        } => {
            let (sheet, config) = source.load()?;
            let conversion = survey_sheets::convert(&sheet, &config)?;
            print_warnings(&conversion.warnings);

            if let Some(n) = preview {
                let head = &conversion.tree.questions[..n.min(conversion.tree.questions.len())];
                println!("{}", serde_json::to_string_pretty(head)?);
            }

            let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.json", sheet.id)));
            write_json(&output, &conversion.tree.to_json()?)?;
        }
        Commands::Transfer {
            source,
            json,
            output,
        } => {
            let tree = read_tree(&json)?;
            let (sheet, config) = source.load()?;
            let result = survey_sheets::transfer(&tree, &sheet, &config)?;
            print_warnings(&result.warnings);
            println!("Updated {} questions", result.updated);

            let output = output.unwrap_or_else(|| {
                let stem = json.file_stem().and_then(|s| s.to_str()).unwrap_or("questions");
                json.with_file_name(format!("{stem}_updated.json"))
            });
            write_json(&output, &serde_json::to_string_pretty(&result.tree)?)?;
        }
        Commands::Validate { source, json } => {
            let tree = read_tree(&json)?;
            let (sheet, config) = source.load()?;
            let validation = survey_sheets::validate(&tree, &sheet, &config)?;

            if validation.is_consistent() {
                println!("Sheet and JSON have the same question ids");
            } else {
                println!("Only in sheet: {}", validation.only_in_sheet.join(", "));
                println!("Only in JSON: {}", validation.only_in_json.join(", "));
            }
        }
    }

    Ok(())
}
