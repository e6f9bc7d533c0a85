//! tabfold CLI - Transform spreadsheet/CSV files into flat or tree JSON
//!
//! ```bash
//! tabfold dealers.xlsx --config dealer.config.json
//! tabfold dealers.xlsx --config dealer.config.json --sheet 1128
//! tabfold dealers.xlsx --config dealer.config.json --sheet 1,Sheet2
//! tabfold dealers.xlsx --config dealer.config.json --out ./dist --format ts
//! ```
//!
//! One JSON and/or TypeScript file is written per processed sheet. A sheet
//! that fails (for example a required header with no match) is logged and
//! skipped; the remaining sheets still process.

use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use tabfold::{
    config_module_source, data_module_source, load_config, log_error, log_info, log_info_indent,
    log_success, log_warning, resolve_headers, transform, CliResult, SheetTable, TransformConfig,
    TransformStats, LOG_SINK,
};
use tabfold::parser::workbook::{load_workbook, resolve_sheets};

#[derive(Parser)]
#[command(name = "tabfold")]
#[command(about = "Transform spreadsheet/CSV files into flat or hierarchical JSON", long_about = None)]
struct Cli {
    /// Input spreadsheet (XLSX/XLS/ODS/CSV)
    input: PathBuf,

    /// Transform configuration file (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Sheets to process: name, 1-based index, comma-separated list, or "all"
    #[arg(short, long)]
    sheet: Option<String>,

    /// Output directory (default: the input file's directory)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "both")]
    format: OutputFormat,

    /// Print the loaded config back as a CommonJS module and exit
    #[arg(long)]
    emit_config: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Ts,
    Both,
}

impl OutputFormat {
    fn json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    fn ts(self) -> bool {
        matches!(self, OutputFormat::Ts | OutputFormat::Both)
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    LOG_SINK.set_quiet(cli.quiet);

    let config = load_config(&cli.config)?;

    if cli.emit_config {
        println!("{}", config_module_source(&config));
        return Ok(());
    }

    let workbook = load_workbook(&cli.input)?;
    let out_dir = cli.out.unwrap_or_else(|| {
        cli.input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    fs::create_dir_all(&out_dir)?;

    let sheet_names = workbook.sheet_names();
    let selected = resolve_sheets(&sheet_names, cli.sheet.as_deref());

    log_info(format!("📘 File: {}", cli.input.display()));
    log_info(format!("📑 Sheets: {}", selected.join(", ")));
    log_info(format!("🧩 Config: {}", cli.config.display()));
    log_info(format!("📁 Output: {}", out_dir.display()));

    for name in &selected {
        let Some(sheet) = workbook.sheet(name) else {
            continue;
        };
        log_info(format!("▶ Processing sheet: {}", name));

        if sheet.rows.is_empty() {
            log_warning("Empty sheet, skipping");
            continue;
        }

        if let Err(e) = process_sheet(sheet, &config, &out_dir, cli.format) {
            log_error(format!("Failed to process sheet '{}': {}", name, e));
        }
    }

    Ok(())
}

fn process_sheet(
    sheet: &SheetTable,
    config: &TransformConfig,
    out_dir: &Path,
    format: OutputFormat,
) -> CliResult<()> {
    print_header_map(sheet, config);

    let output = transform(&sheet.rows, config)?;
    print_stats(&output.stats, config);

    let base = format!("{}_{}", config.name, sheet.name);

    if format.json() {
        let path = out_dir.join(format!("{}.json", base));
        fs::write(&path, serde_json::to_string_pretty(&output.data)?)?;
        log_success(format!("JSON: {}", path.display()));
    }

    if format.ts() {
        let path = out_dir.join(format!("{}.ts", base));
        fs::write(&path, data_module_source(&config.ts_export_name, &output.data))?;
        log_success(format!("TS: {}", path.display()));
    }

    Ok(())
}

fn print_header_map(sheet: &SheetTable, config: &TransformConfig) {
    let header_map = resolve_headers(&sheet.rows, &config.header_mapping);
    log_info("🧭 Header mapping:");
    for logical in config.header_mapping.keys() {
        match header_map.resolve(logical) {
            Some(header) => log_info_indent(format!("{} -> {}", logical, header), 1),
            None => log_info_indent(format!("{} -> (unmatched)", logical), 1),
        }
    }
}

fn print_stats(stats: &TransformStats, config: &TransformConfig) {
    log_info("📊 Stats:");
    log_info_indent(format!("Total rows:   {}", stats.total_rows), 1);
    log_info_indent(format!("Used rows:    {}", stats.used_rows), 1);
    log_info_indent(format!("Skipped rows: {}", stats.skipped_rows), 1);

    for (i, count) in stats.group_counts.iter().enumerate() {
        let label = config
            .group_levels
            .get(i)
            .map(|level| level.node_name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Level {}", i + 1));
        log_info_indent(format!("{}: {}", label, count), 1);
    }

    log_info_indent(format!("Leaf records: {}", stats.leaf_count), 1);
}
