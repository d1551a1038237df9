//! Course import CLI - validate XLSX course sheets for the LMS
//!
//! # Commands
//!
//! ```bash
//! course-import serve                                   # Start HTTP server (port 3000)
//! course-import parse courses.xlsx                      # Decode to JSON
//! course-import validate courses.xlsx --catalogs c.json # Offline import against a snapshot
//! course-import headers --sections 2 --lessons 3        # Print a header template row
//! ```

use clap::{Parser, Subcommand};
use course_import::{
    check_format, decode_workbook, header_template, import_upload, Config, ImportError, ImportLog,
    ImportOptions, SnapshotCatalogs, Upload, ValidationError,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "course-import")]
#[command(about = "Decode and validate XLSX course bulk uploads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Decode an XLSX file and output the courses as JSON
    Parse {
        /// Input XLSX file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a full import against a catalog snapshot
    Validate {
        /// Input XLSX file
        input: PathBuf,

        /// Reference catalog snapshot (JSON)
        #[arg(short, long)]
        catalogs: PathBuf,

        /// Write validation errors as CSV
        #[arg(long)]
        errors_csv: Option<PathBuf>,

        /// Largest accepted batch
        #[arg(long, default_value_t = 100)]
        max_courses: usize,
    },

    /// Print the header row for an empty upload sheet
    Headers {
        /// Sections per course
        #[arg(short, long, default_value_t = 1)]
        sections: usize,

        /// Lessons per section
        #[arg(short, long, default_value_t = 1)]
        lessons: usize,

        /// Content items per lesson
        #[arg(short, long, default_value_t = 1)]
        contents: usize,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port } => cmd_serve(port).await,

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Validate {
            input,
            catalogs,
            errors_csv,
            max_courses,
        } => cmd_validate(&input, &catalogs, errors_csv.as_deref(), max_courses).await,

        Commands::Headers {
            sections,
            lessons,
            contents,
            output,
        } => cmd_headers(sections, lessons, contents, output.as_deref()),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

type CmdResult = Result<bool, Box<dyn std::error::Error>>;

async fn cmd_serve(port: Option<u16>) -> CmdResult {
    let mut config = Config::from_env()?;
    if let Some(port) = port {
        config = config.with_port(port);
    }
    course_import::server::start_server(config).await?;
    Ok(true)
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> CmdResult {
    eprintln!("📄 Parsing XLSX: {}", input.display());

    check_format(&input.to_string_lossy())?;
    let decoded = decode_workbook(&fs::read(input)?)?;

    eprintln!("   Sheet: {}", decoded.sheet_name);
    eprintln!("   Columns: {}", decoded.headers.len());
    if !decoded.skipped_rows.is_empty() {
        eprintln!("   Skipped blank rows: {:?}", decoded.skipped_rows);
    }
    for warning in decoded.layout.warnings() {
        eprintln!("   ⚠️  {}", warning);
    }
    eprintln!("✅ Decoded {} courses", decoded.courses.len());

    let json = serde_json::to_string_pretty(&decoded.courses)?;
    write_output(&json, output)?;

    Ok(true)
}

async fn cmd_validate(
    input: &Path,
    catalogs: &Path,
    errors_csv: Option<&Path>,
    max_courses: usize,
) -> CmdResult {
    eprintln!("✔️  Validating: {}", input.display());

    let source = SnapshotCatalogs::from_path(catalogs)?;
    eprintln!(
        "   Catalogs: {} entries from {}",
        source.catalogs().total_entries(),
        catalogs.display()
    );

    let upload = Upload::new(input.to_string_lossy(), fs::read(input)?);
    let options = ImportOptions { max_courses, ..Default::default() };
    let log = ImportLog::new("cli");

    match import_upload(&upload, &source, &options, &log).await {
        Ok(report) => {
            eprintln!("\n✅ All {} courses valid!", report.courses.len());
            for course in &report.courses {
                eprintln!(
                    "   Row {}: {} ({} sections, {} lessons, {} content items)",
                    course.source_row,
                    course.course_title,
                    course.sections.len(),
                    course.lesson_count(),
                    course.content_count()
                );
            }
            Ok(true)
        }
        Err(ImportError::Validation(errors)) => {
            eprintln!("\n❌ {} validation errors:", errors.len());
            for error in &errors {
                eprintln!("   - {}", error);
            }
            if let Some(path) = errors_csv {
                write_errors_csv(&errors, path)?;
                eprintln!("💾 Errors written to: {}", path.display());
            }
            Ok(false)
        }
        Err(other) => {
            eprintln!("\n❌ Rejected: {}", other);
            Ok(false)
        }
    }
}

fn cmd_headers(sections: usize, lessons: usize, contents: usize, output: Option<&Path>) -> CmdResult {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header_template(sections, lessons, contents))?;
    let row = String::from_utf8(writer.into_inner()?)?;

    write_output(row.trim_end(), output)?;
    Ok(true)
}

fn write_errors_csv(errors: &[ValidationError], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Row", "Field", "Message"])?;
    for error in errors {
        writer.write_record([error.row.to_string(), error.field.clone(), error.message.clone()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
