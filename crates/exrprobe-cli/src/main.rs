use clap::{Parser, Subcommand};
use std::path::PathBuf;

use exrprobe_core::{analyze, load_config, AnalysisConfig, ImageSource, QualityReport};

#[derive(Parser)]
#[command(name = "exrprobe")]
#[command(version, about = "EXR bit depth and quality analyzer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (YAML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one EXR file and print its quality report
    Analyze {
        /// Input file
        input: PathBuf,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,

        /// Use the detailed (512-bin) histogram in the summary
        #[arg(long)]
        detailed: bool,
    },

    /// Compare quality metrics of two EXR files side by side
    Compare {
        /// First input file
        first: PathBuf,

        /// Second input file
        second: PathBuf,

        /// Emit both reports as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    exrprobe_core::config::set_verbose(cli.verbose);

    let handle = load_config(cli.config.as_deref());
    for warning in &handle.warnings {
        eprintln!("Warning: {}", warning);
    }

    let result = match cli.command {
        Commands::Analyze {
            input,
            json,
            detailed,
        } => cmd_analyze(input, json, detailed, &handle.config),
        Commands::Compare {
            first,
            second,
            json,
        } => cmd_compare(first, second, json, &handle.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_analyze(
    input: PathBuf,
    json: bool,
    detailed: bool,
    config: &AnalysisConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = ImageSource::from_file(&input)?;
    let analysis = analyze(&source, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis.report)?);
        return Ok(());
    }

    print_report(&analysis.report);
    print_histogram_summary(&analysis, detailed, config);
    Ok(())
}

fn cmd_compare(
    first: PathBuf,
    second: PathBuf,
    json: bool,
    config: &AnalysisConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let source_a = ImageSource::from_file(&first)?;
    let report_a = analyze(&source_a, config)?.report;

    let source_b = ImageSource::from_file(&second)?;
    let report_b = analyze(&source_b, config)?.report;

    if json {
        let pair = serde_json::json!({
            "first": report_a,
            "second": report_b,
        });
        println!("{}", serde_json::to_string_pretty(&pair)?);
        return Ok(());
    }

    print_comparison(&report_a, &report_b);
    Ok(())
}

fn display_name(report: &QualityReport) -> &str {
    report.file_name.as_deref().unwrap_or("<memory>")
}

fn print_report(report: &QualityReport) {
    println!("FILE INFO");
    println!("{}", "-".repeat(60));
    println!("  Filename:       {}", display_name(report));
    println!("  Resolution:     {} x {}", report.width, report.height);
    println!(
        "  File Size:      {:.1} MB",
        report.file_size as f64 / 1024.0 / 1024.0
    );
    println!("  Compression:    {}", report.compression);
    println!("  Bit Depth:      {}", report.native_depth);
    println!("  Color Space:    {}", report.colorspace);
    println!("  Encoding:       {}", report.encoding);
    println!();

    println!("QUALITY METRICS");
    println!("{}", "-".repeat(60));
    println!(
        "  Range:          {:.3} — {:.3}",
        report.range_min, report.range_max
    );
    println!("  Above 1.0:      {:.1}%", report.above_one_percent);
    println!("  Unique Values:  {:.0}", report.avg_unique);
    println!(
        "  Midtone Step:   {:.1}x finer than 8-bit",
        report.avg_step_ratio
    );
    println!("  Effective Bits: ~{:.1} bits", report.effective_bits);
    println!("  Quality:        {}", report.rating);
    println!();

    println!("CHANNEL ANALYSIS");
    println!("{}", "-".repeat(60));
    println!(
        "  {:<8} {:>10} {:>10} {:>10} {:>10}",
        "Channel", "Min", "Max", "Mean", "Unique"
    );
    for channel in &report.channels {
        println!(
            "  {:<8} {:>10.4} {:>10.4} {:>10.4} {:>10}",
            channel.name, channel.min, channel.max, channel.mean, channel.unique_count
        );
    }
    println!();
}

fn print_histogram_summary(
    analysis: &exrprobe_core::Analysis,
    detailed: bool,
    config: &AnalysisConfig,
) {
    let visible = analysis.tensor.present;
    let series = exrprobe_core::histogram(&analysis.tensor, visible, detailed, config);

    println!("HISTOGRAM ({} bins)", series.bin_edges.len() - 1);
    println!("{}", "-".repeat(60));
    for channel in &series.channels {
        let peak_bin = channel
            .density
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let peak_value =
            (series.bin_edges[peak_bin] + series.bin_edges[peak_bin + 1]) / 2.0;
        println!(
            "  {}: density peak at value {:.3} (display cap {:.2})",
            channel.name, peak_value, series.y_cap
        );
    }
    println!();
}

fn print_comparison(a: &QualityReport, b: &QualityReport) {
    println!("COMPARISON");
    println!("{}", "-".repeat(78));
    println!(
        "  {:<16} {:>28} {:>28}",
        "Metric",
        display_name(a),
        display_name(b)
    );

    let rows: Vec<(&str, String, String)> = vec![
        (
            "File Size",
            format!("{:.1} MB", a.file_size as f64 / 1024.0 / 1024.0),
            format!("{:.1} MB", b.file_size as f64 / 1024.0 / 1024.0),
        ),
        ("Compression", a.compression.clone(), b.compression.clone()),
        (
            "Range",
            format!("{:.3} - {:.3}", a.range_min, a.range_max),
            format!("{:.3} - {:.3}", b.range_min, b.range_max),
        ),
        (
            "Above 1.0",
            format!("{:.1}%", a.above_one_percent),
            format!("{:.1}%", b.above_one_percent),
        ),
        (
            "Unique Values",
            format!("{:.0}", a.avg_unique),
            format!("{:.0}", b.avg_unique),
        ),
        (
            "Midtone Step",
            format!("{:.1}x", a.avg_step_ratio),
            format!("{:.1}x", b.avg_step_ratio),
        ),
        (
            "Effective Bits",
            format!("~{:.1}", a.effective_bits),
            format!("~{:.1}", b.effective_bits),
        ),
        ("Quality", a.rating.to_string(), b.rating.to_string()),
    ];

    for (label, va, vb) in rows {
        println!("  {:<16} {:>28} {:>28}", label, va, vb);
    }

    let diff = a.effective_bits - b.effective_bits;
    if diff.abs() > 0.2 {
        let winner = if diff > 0.0 {
            display_name(a)
        } else {
            display_name(b)
        };
        println!();
        println!(
            "  {} has ~{:.1} more effective bits",
            winner,
            diff.abs()
        );
    }
}
