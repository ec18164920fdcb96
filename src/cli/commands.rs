use crate::config::RegistryConfig;
use crate::core::{CommitOutcome, Session};
use crate::error::{RegistryError, RegistryResult};
use crate::excel::{ExcelImporter, XlsxFileSink};
use crate::types::{parse_date, Category};
use chrono::NaiveDate;
use colored::Colorize;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One staged edit as given on the command line or in a batch file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditRequest {
    pub category: Category,
    pub volunteer: String,
    pub course: String,
    pub date: NaiveDate,
}

/// Batch file layout for `apply --batch`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditBatch {
    #[serde(default)]
    pub edits: Vec<EditRequest>,
}

impl EditBatch {
    pub fn from_yaml_file(path: &Path) -> RegistryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| RegistryError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Parse `CATEGORY|VOLUNTEER|COURSE|YYYY-MM-DD`
pub fn parse_edit_arg(arg: &str) -> RegistryResult<EditRequest> {
    let parts: Vec<&str> = arg.split('|').collect();
    if parts.len() != 4 {
        return Err(RegistryError::Config(format!(
            "edit '{}' must look like CATEGORY|VOLUNTEER|COURSE|YYYY-MM-DD",
            arg
        )));
    }
    Ok(EditRequest {
        category: parts[0].parse()?,
        volunteer: parts[1].trim().to_string(),
        course: parts[2].trim().to_string(),
        date: parse_date(parts[3])?,
    })
}

fn open_session(file: &Path, config: &RegistryConfig) -> RegistryResult<Session> {
    let tables = ExcelImporter::new(file).import()?;
    Session::open(tables, config)
}

/// Execute the sheets command - show found sheets and how categories resolved
pub fn sheets(file: PathBuf, config: &RegistryConfig) -> RegistryResult<()> {
    println!("{}", "📒 Course Registry - Sheets".bold().green());
    println!("   File: {}\n", file.display());

    let session = open_session(&file, config)?;

    println!("   Found sheets: {}", session.found_sheets().join(", "));
    for category in Category::ALL {
        let table = session.table(category);
        println!(
            "   {} → '{}' ({} rows, {} columns)",
            category.as_str().bright_blue().bold(),
            table.name,
            table.height(),
            table.width()
        );
    }
    Ok(())
}

/// Execute the volunteers command - list selectable volunteers
pub fn volunteers(file: PathBuf, category: Category, config: &RegistryConfig) -> RegistryResult<()> {
    let session = open_session(&file, config)?;
    let names = session.volunteers(category);

    println!(
        "{}",
        format!("👥 {} volunteers in {}", names.len(), category)
            .bold()
            .green()
    );
    for name in &names {
        println!("   {}", name);
    }
    Ok(())
}

/// Execute the courses command - list course labels and their columns
pub fn courses(file: PathBuf, category: Category, config: &RegistryConfig) -> RegistryResult<()> {
    let session = open_session(&file, config)?;
    let catalog = session.catalog(category);

    println!(
        "{}",
        format!("🎓 {} courses in {}", catalog.len(), category)
            .bold()
            .green()
    );
    for course in catalog.courses() {
        println!("   {} {}", format!("[{}]", course.column).cyan(), course.label);
    }
    if catalog.collisions() > 0 {
        println!(
            "{}",
            format!(
                "⚠️  {} repeated course labels; only the last column is kept for each",
                catalog.collisions()
            )
            .yellow()
        );
    }
    Ok(())
}

/// Execute the preview command - print the first rows of a category table
pub fn preview(
    file: PathBuf,
    category: Category,
    rows: usize,
    config: &RegistryConfig,
) -> RegistryResult<()> {
    let session = open_session(&file, config)?;
    let table = session.table(category);

    println!(
        "{}",
        format!("📋 {} ('{}')", category, table.name).bold().green()
    );
    let headers: Vec<&str> = table.column_names().collect();
    println!("   {}", headers.join(" | ").cyan());
    for row in table.rows().iter().take(rows) {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        println!("   {}", cells.join(" | "));
    }
    if table.height() > rows {
        println!("   ... {} more rows", table.height() - rows);
    }
    Ok(())
}

/// Execute the apply command - stage edits, then commit them into `output`
pub fn apply(
    input: PathBuf,
    output: PathBuf,
    edits: Vec<String>,
    batch: Option<PathBuf>,
    dry_run: bool,
    config: &RegistryConfig,
) -> RegistryResult<()> {
    println!("{}", "📒 Course Registry - Applying edits".bold().green());
    println!("   Input:  {}", input.display());
    println!("   Output: {}\n", output.display());

    let mut requests: Vec<EditRequest> = Vec::new();
    if let Some(path) = batch {
        requests.extend(EditBatch::from_yaml_file(&path)?.edits);
    }
    for arg in &edits {
        requests.push(parse_edit_arg(arg)?);
    }

    let mut session = open_session(&input, config)?;

    for request in &requests {
        let edit = session.add_edit(request.category, &request.volunteer, &request.course, request.date)?;
        println!(
            "   {} Course {} staged for {}",
            "➕".green(),
            request.course.bright_blue(),
            edit.identity
        );
    }

    if !session.pending_edits().is_empty() {
        println!("\n{}", "Courses to update:".bold().cyan());
        for (position, edit) in session.pending_edits().iter().enumerate() {
            println!("   {}. {}", position, session.describe_edit(edit));
        }
        println!();
    }

    if dry_run {
        println!("{}", "📋 Dry run complete - no changes written".yellow());
        return Ok(());
    }

    let sink = XlsxFileSink::new(&output);
    match session.commit(&sink)? {
        CommitOutcome::NothingToCommit => {
            println!("{}", "⚠️  No changes to save".yellow());
        }
        CommitOutcome::Committed(report) => {
            println!(
                "{}",
                format!(
                    "✅ All changes saved: {} edits, {} cells written",
                    report.applied, report.cells_written
                )
                .bold()
                .green()
            );
            for skipped in &report.skipped {
                println!(
                    "   {} edit {} skipped ({:?}): {} / {}",
                    "⚠️".yellow(),
                    skipped.position,
                    skipped.reason,
                    skipped.identity,
                    skipped.column
                );
            }
            println!("   Written to {}", sink.path().display());
        }
    }
    Ok(())
}
