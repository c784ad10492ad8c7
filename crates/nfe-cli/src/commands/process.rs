//! Process command - extract items from NF-e XML files and export them.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use nfe_core::{
    filter_items, AllowedPrefixes, BatchProcessor, ExportOutcome, InvoiceItem, NfeConfig,
    NfeExtractor, XlsxExporter,
};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input XML files, directories or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory (default: current directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "xlsx")]
    format: OutputFormat,

    /// Skip the NCM-filtered export
    #[arg(long)]
    no_filter: bool,

    /// Allowed NCM prefixes, comma-separated (overrides the configured list)
    #[arg(long, conflicts_with = "allowed_file")]
    allowed: Option<String>,

    /// File with allowed NCM prefixes, comma- or newline-separated
    #[arg(long)]
    allowed_file: Option<PathBuf>,

    /// Print the first N extracted items as a table
    #[arg(long, value_name = "N")]
    preview: Option<usize>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Excel workbook
    Xlsx,
    /// CSV table
    Csv,
    /// JSON array
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let (config, _) = load_config(config_path)?;
    let prefixes = allowed_prefixes(&args, &config)?;

    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No XML files found for: {}", args.inputs.join(", "));
    }

    println!(
        "{} Found {} XML files to process",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let processor = BatchProcessor::with_extractor(NfeExtractor::from_config(&config.extraction));
    let outcome = processor.run(files.as_slice(), |progress| {
        pb.set_position(progress.index as u64 - 1);
        pb.set_message(progress.to_string());
    });
    pb.set_position(files.len() as u64);
    pb.finish_and_clear();

    println!(
        "{} {} ({} files in {:?})",
        style("✓").green(),
        outcome.status_message(),
        outcome.files_processed,
        start.elapsed()
    );

    if !outcome.errors.is_empty() {
        println!();
        println!("{}", style("Some files could not be processed:").red());
        for error in &outcome.errors {
            println!("  - {}", error);
        }
    }

    if let Some(rows) = args.preview {
        print_preview(&outcome.items, rows);
    }

    let output_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;

    println!();
    let full_path = output_path(&output_dir, &config.export.full_file_name, args.format);
    report_export(export(&outcome.items, &full_path, args.format, &config)?);

    if !args.no_filter {
        let filtered = filter_items(&outcome.items, &prefixes);
        debug!(
            "{} of {} items match {} allowed prefixes",
            filtered.len(),
            outcome.items.len(),
            prefixes.len()
        );
        let filtered_path =
            output_path(&output_dir, &config.export.filtered_file_name, args.format);
        report_export(export(&filtered, &filtered_path, args.format, &config)?);
    }

    Ok(())
}

fn allowed_prefixes(args: &ProcessArgs, config: &NfeConfig) -> anyhow::Result<AllowedPrefixes> {
    if let Some(list) = &args.allowed {
        return Ok(AllowedPrefixes::parse(list));
    }
    if let Some(path) = &args.allowed_file {
        let text = fs::read_to_string(path)?;
        return Ok(AllowedPrefixes::parse(&text));
    }
    Ok(config.filter.allowed_prefixes.clone())
}

/// Expand files, directories and glob patterns into `.xml` paths.
fn collect_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && is_xml(p))
                .collect();
            entries.sort();
            files.extend(entries);
        } else if path.is_file() {
            if is_xml(path) {
                files.push(path.to_path_buf());
            } else {
                warn!("Skipping non-XML file {}", path.display());
            }
        } else {
            let matched: Vec<PathBuf> = glob(input)?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file() && is_xml(p))
                .collect();
            if matched.is_empty() {
                warn!("No XML files match {}", input);
            }
            files.extend(matched);
        }
    }

    Ok(files)
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
}

fn output_path(dir: &Path, file_name: &str, format: OutputFormat) -> PathBuf {
    dir.join(file_name).with_extension(format.extension())
}

fn export(
    items: &[InvoiceItem],
    path: &Path,
    format: OutputFormat,
    config: &NfeConfig,
) -> anyhow::Result<ExportOutcome> {
    if items.is_empty() {
        return Ok(ExportOutcome::NothingToExport);
    }

    match format {
        OutputFormat::Xlsx => Ok(XlsxExporter::from_config(&config.export).export_to_path(items, path)?),
        OutputFormat::Csv => {
            fs::write(path, format_csv(items)?)?;
            Ok(ExportOutcome::Written { path: path.to_path_buf(), rows: items.len() })
        }
        OutputFormat::Json => {
            fs::write(path, serde_json::to_string_pretty(items)?)?;
            Ok(ExportOutcome::Written { path: path.to_path_buf(), rows: items.len() })
        }
    }
}

fn report_export(outcome: ExportOutcome) {
    match outcome {
        ExportOutcome::Written { .. } => {
            println!("{} {}", style("✓").green(), outcome.status_message())
        }
        ExportOutcome::NothingToExport => {
            println!("{} {}", style("ℹ").blue(), outcome.status_message())
        }
    }
}

fn format_csv(items: &[InvoiceItem]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(InvoiceItem::headers())?;
    for item in items {
        wtr.write_record(item.values())?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn print_preview(items: &[InvoiceItem], rows: usize) {
    if items.is_empty() || rows == 0 {
        return;
    }

    println!();
    println!(
        "{}",
        style(format!(
            "{:<44}  {:<14}  {:<30}  {:<8}  {:<4}  {:>12}",
            "Chave", "Código", "Produto", "NCM", "CFOP", "Valor"
        ))
        .bold()
    );
    for item in items.iter().take(rows) {
        println!(
            "{:<44}  {:<14}  {:<30}  {:<8}  {:<4}  {:>12}",
            item.invoice_key,
            truncate(&item.product_code, 14),
            truncate(&item.description, 30),
            item.ncm,
            item.cfop,
            item.total_value
        );
    }
    if items.len() > rows {
        println!("... {} more items", items.len() - rows);
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_replaces_extension() {
        let path = output_path(Path::new("out"), "itens_nfe_completo.xlsx", OutputFormat::Csv);
        assert_eq!(path, Path::new("out/itens_nfe_completo.csv"));
    }

    #[test]
    fn test_is_xml_ignores_case() {
        assert!(is_xml(Path::new("a/NOTA.XML")));
        assert!(is_xml(Path::new("nota.xml")));
        assert!(!is_xml(Path::new("nota.txt")));
        assert!(!is_xml(Path::new("xml")));
    }

    #[test]
    fn test_format_csv_keeps_text() {
        let items = vec![InvoiceItem {
            ean: "07891234567895".to_string(),
            description: "PARAFUSO, ACO".to_string(),
            ..Default::default()
        }];
        let csv = format_csv(&items).unwrap();
        let mut lines = csv.lines();

        assert!(lines.next().unwrap().starts_with("Chave,Data Emissão,"));
        assert!(lines.next().unwrap().contains(",07891234567895,\"PARAFUSO, ACO\","));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }

    #[test]
    fn test_collect_inputs_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.xml"), "<a/>").unwrap();
        fs::write(dir.path().join("a.XML"), "<a/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = collect_inputs(&[dir.path().display().to_string()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.XML", "b.xml"]);
    }
}
