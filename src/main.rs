// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

use labor_dashboard::selection::parse_selection;
use labor_dashboard::table::COL_VALUE;
use labor_dashboard::{
    logging, CleanedTable, CleaningPipeline, DashboardConfig, Session, ViewModel, VERSION,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = DashboardConfig::load()?;

    match args.get(1).map(String::as_str) {
        Some("clean") => {
            logging::init_logging(None);
            run_clean(&config, &args[2..])
        }
        Some("render") => {
            logging::init_logging(None);
            run_render(&config, &args[2..])
        }
        Some("export") => {
            logging::init_logging(None);
            run_export(&config, &args[2..])
        }
        Some(other) => bail!(
            "Unknown command '{}'. Usage: labor-dashboard [clean [INPUT] [OUTPUT] | render [SECTION] [INDICATOR] [CHART] [FROM] [TO] | export INDICATOR [FROM] [TO]]",
            other
        ),
        None => {
            // Keep the terminal quiet while the UI owns it
            logging::init_logging(Some("labor_dashboard=warn"));
            run_ui_mode(&config)
        }
    }
}

fn run_clean(config: &DashboardConfig, args: &[String]) -> Result<()> {
    println!("🧹 Cleaning Pipeline v{} - raw export → cleaned table", VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let input = args.first().map(PathBuf::from).unwrap_or_else(|| config.raw_input.clone());
    let output = args.get(1).map(PathBuf::from).unwrap_or_else(|| config.cleaned_output.clone());

    println!("\n📂 Reading {}", input.display());
    let report = CleaningPipeline::new()
        .run(&input, &output)
        .with_context(|| format!("Cleaning failed for {}", input.display()))?;

    println!("✓ Columns: {}", report.columns.join(", "));
    println!("✓ Dropped: {}", report.dropped_columns.join(", "));
    println!("✓ Duplicate rows: {}", report.duplicate_rows);
    println!("\n🔍 Missing values per column:");
    for m in &report.missing_values {
        println!("   {:<20} {}", m.column, m.missing);
    }
    println!(
        "   {} of {} observations have no Value",
        report.missing_in(COL_VALUE),
        report.rows
    );
    println!("\n📊 Unique indicators: {}", report.distinct_indicators);
    for name in &report.sample_indicators {
        println!("   • {}", name);
    }
    if let Some((min, max)) = report.year_range {
        println!("📅 Time range: {} to {}", min, max);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if report.has_warnings() {
        println!("⚠️  Completed with warnings:");
        for d in &report.diagnostics {
            println!("   [{:?}] {}: {}", d.severity, d.field, d.issue);
        }
    }
    println!("✅ {}", report.summary());
    println!("✅ Saved to {}", output.display());

    Ok(())
}

fn load_session(config: &DashboardConfig) -> Result<Session> {
    let path = &config.cleaned_output;
    if !path.exists() {
        bail!(
            "Cleaned table not found at {}. Run: labor-dashboard clean",
            path.display()
        );
    }
    let table = CleanedTable::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(Session::new(table, config.render_options()))
}

fn year_arg(args: &[String], i: usize) -> Result<Option<i32>> {
    match args.get(i).map(String::as_str) {
        None | Some("-") => Ok(None),
        Some(s) => Ok(Some(
            s.parse().with_context(|| format!("Invalid year '{}'", s))?,
        )),
    }
}

fn run_render(config: &DashboardConfig, args: &[String]) -> Result<()> {
    let session = load_session(config)?;
    let selection = parse_selection(
        args.first().map(String::as_str),
        args.get(1).map(String::as_str),
        args.get(2).map(String::as_str),
        year_arg(args, 3)?,
        year_arg(args, 4)?,
    )?;

    let view = session.render(&selection);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn run_export(config: &DashboardConfig, args: &[String]) -> Result<()> {
    let Some(indicator) = args.first() else {
        bail!("Usage: labor-dashboard export INDICATOR [FROM] [TO]");
    };
    let session = load_session(config)?;
    let selection = parse_selection(None, Some(indicator.as_str()), None, year_arg(args, 1)?, year_arg(args, 2)?)?;

    match session.render(&selection) {
        ViewModel::Detail(detail) => {
            let path = detail.export()?.write_into(&config.export_dir)?;
            println!(
                "✓ Exported {} rows ({}-{}) to {}",
                detail.rows.len(),
                detail.range.start,
                detail.range.end,
                path.display()
            );
            Ok(())
        }
        ViewModel::NoData(no_data) => bail!("{}", no_data.message),
        ViewModel::Overview(_) => bail!("No indicator selected"),
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &DashboardConfig) -> Result<()> {
    println!("🖥️  Loading Labor & Social Protection Dashboard v{}...\n", VERSION);

    let session = load_session(config)?;
    println!("✓ Loaded {} observations\n", session.table().len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(session, config.export_dir.clone());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &DashboardConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin dashboard-server --features server");
    std::process::exit(1);
}
