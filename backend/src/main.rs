//! xteconv CLI - convert TISS monitoring XTE files to tables and back
//!
//! # Commands
//!
//! ```bash
//! xteconv decode a.xte b.xte -o dados.csv   # XTE files -> one table
//! xteconv decode a.xte -o dados.xlsx        # same, as a workbook
//! xteconv encode dados.csv -d saida         # table -> .xml/.xte per origin
//! xteconv encode dados.csv -d saida --zip   # same, as two ZIP bundles
//! xteconv columns                           # blank table template
//! xteconv serve                             # HTTP server (port 3000)
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use xteconv::archive::TABLE_BUNDLE_NAME;
use xteconv::pipeline::format_delimiter;
use xteconv::{
    decode_paths, encode_file, table, write_artifacts, write_bundles, PipelineError, Settings,
};

#[derive(Parser)]
#[command(name = "xteconv")]
#[command(about = "Convert TISS 5.01.00 monitoring XTE files to flat tables and back", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode XTE/XML files into one table
    Decode {
        /// Input XTE or XML files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output table (.xlsx for a workbook, anything else for ;-delimited text)
        #[arg(short, long, default_value = TABLE_BUNDLE_NAME)]
        output: PathBuf,

        /// Also write the rows as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Encode a table into one XTE document per origin
    Encode {
        /// Input table (.xlsx, or ;, ',', tab or | delimited text)
        input: PathBuf,

        /// Output directory
        #[arg(short = 'd', long, default_value = ".")]
        out_dir: PathBuf,

        /// Write the .xml and .xte ZIP bundles instead of loose files
        #[arg(long)]
        zip: bool,
    },

    /// Print the table header as a blank template
    Columns,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: XTECONV_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Decode {
            files,
            output,
            json,
        } => cmd_decode(&files, &output, json.as_deref()),

        Commands::Encode { input, out_dir, zip } => cmd_encode(&input, &out_dir, zip, &settings),

        Commands::Columns => cmd_columns(),

        Commands::Serve { port } => cmd_serve(port, settings).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_decode(
    files: &[PathBuf],
    output: &Path,
    json: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Decoding {} file(s)", files.len());

    let outcome = decode_paths(files);

    for failure in &outcome.failures {
        eprintln!("   ❌ {}: {}", failure.file, failure.error);
    }
    if outcome.all_failed() {
        return Err(PipelineError::AllFailed(outcome.failures.len()).into());
    }

    table::write_table_file(output, &outcome.records)?;
    eprintln!("💾 {} rows written to: {}", outcome.records.len(), output.display());

    if let Some(path) = json {
        let content = serde_json::to_string_pretty(&outcome.records)?;
        fs::write(path, content)?;
        eprintln!("💾 JSON written to: {}", path.display());
    }

    if !outcome.failures.is_empty() {
        eprintln!(
            "⚠️  {} of {} file(s) failed",
            outcome.failures.len(),
            outcome.decoded_files + outcome.failures.len()
        );
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_encode(
    input: &Path,
    out_dir: &Path,
    zip: bool,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Encoding: {}", input.display());

    let outcome = encode_file(input, &settings.now())?;

    let info = &outcome.table_info;
    eprintln!("   Format: {}", info.format.as_str());
    if let Some(delimiter) = info.delimiter {
        eprintln!("   Encoding: {}", info.encoding);
        eprintln!("   Delimiter: '{}'", format_delimiter(delimiter));
    }
    eprintln!("   Rows: {}", outcome.table_info.row_count);
    if outcome.skipped_rows > 0 {
        eprintln!("   ⚠️  Skipped {} row(s) without origin", outcome.skipped_rows);
    }

    let written = if zip {
        write_bundles(&outcome.artifacts, out_dir)?
    } else {
        write_artifacts(&outcome.artifacts, out_dir)?
    };

    eprintln!("\n📦 {} document(s)", outcome.artifacts.documents);
    for path in &written {
        eprintln!("   💾 {}", path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_columns() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&table::template()?)?;
    stdout.flush()?;
    Ok(())
}

async fn cmd_serve(port: Option<u16>, mut settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        settings.port = port;
    }
    xteconv::server::start_server(settings).await
}
