use clap::{Parser, Subcommand};
use course_registry::cli;
use course_registry::config::RegistryConfig;
use course_registry::types::Category;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "course-registry")]
#[command(about = "Record volunteer course completions in the registry workbook.")]
#[command(long_about = "Course Registry - stage and commit course completion dates

The registry workbook holds two sheets, 'HONORARIOS ' and 'ACTIVOS '
(matched case-insensitively, trailing space included). Volunteer names sit
in the unnamed columns D, E and F; course names sit in the first data row
from column P onward, and completion dates go under them.

COMMANDS:
  sheets      - Show which sheets were found and how they resolved
  volunteers  - List selectable volunteers of a category
  courses     - List courses of a category and their columns
  preview     - Print the first rows of a category table
  apply       - Stage edits and commit them into an output workbook

EXAMPLES:
  course-registry volunteers registro.xlsx -c activos
  course-registry apply registro.xlsx -o salida.xlsx \\
      -e 'HONORARIOS|Ana Lopez Diaz|Primeros Auxilios|2024-03-01'
  course-registry apply registro.xlsx -o salida.xlsx --batch edits.yaml")]
#[command(version)]
struct Cli {
    /// Layout/commit configuration (YAML)
    #[arg(long, global = true, env = "COURSE_REGISTRY_LAYOUT")]
    layout: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show found sheets and the resolved category tables
    Sheets {
        /// Path to the registry workbook (.xlsx)
        file: PathBuf,
    },

    /// List selectable volunteers of a category
    Volunteers {
        /// Path to the registry workbook (.xlsx)
        file: PathBuf,

        /// HONORARIOS or ACTIVOS
        #[arg(short, long)]
        category: Category,
    },

    /// List courses of a category
    Courses {
        /// Path to the registry workbook (.xlsx)
        file: PathBuf,

        /// HONORARIOS or ACTIVOS
        #[arg(short, long)]
        category: Category,
    },

    /// Print the first rows of a category table
    Preview {
        /// Path to the registry workbook (.xlsx)
        file: PathBuf,

        /// HONORARIOS or ACTIVOS
        #[arg(short, long)]
        category: Category,

        /// Number of data rows to show
        #[arg(short, long, default_value = "10")]
        rows: usize,
    },

    #[command(long_about = "Stage course completions and commit them.

Each edit names a category, a volunteer (full name exactly as listed by
'volunteers'), a course label (as listed by 'courses') and a date.
Edits are validated while staging; one unknown volunteer or course stops
the run before anything is written.

EDIT FORMAT:
  CATEGORY|VOLUNTEER|COURSE|YYYY-MM-DD

BATCH FILE:
  edits:
    - category: ACTIVOS
      volunteer: Ana Lopez Diaz
      course: Primeros Auxilios
      date: 2024-03-01")]
    /// Stage edits and commit them into an output workbook
    Apply {
        /// Path to the registry workbook (.xlsx)
        input: PathBuf,

        /// Where to write the updated workbook
        #[arg(short, long)]
        output: PathBuf,

        /// Edit to stage (repeatable)
        #[arg(short, long = "edit")]
        edits: Vec<String>,

        /// YAML file with an 'edits' list
        #[arg(short, long)]
        batch: Option<PathBuf>,

        /// Stage and list edits without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RegistryConfig::load(cli.layout.as_deref())?;

    match cli.command {
        Commands::Sheets { file } => cli::sheets(file, &config)?,

        Commands::Volunteers { file, category } => cli::volunteers(file, category, &config)?,

        Commands::Courses { file, category } => cli::courses(file, category, &config)?,

        Commands::Preview {
            file,
            category,
            rows,
        } => cli::preview(file, category, rows, &config)?,

        Commands::Apply {
            input,
            output,
            edits,
            batch,
            dry_run,
        } => cli::apply(input, output, edits, batch, dry_run, &config)?,
    }

    Ok(())
}
