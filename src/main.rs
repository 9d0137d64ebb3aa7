// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;

use county_market_map::{Dashboard, DashboardConfig, DataLoader};

fn main() -> Result<()> {
    // Logs go to stderr so they never tear the TUI
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "county_market_map=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let config = DashboardConfig::from_env()?;
    let loader = DataLoader::new();

    if args.len() > 1 && args[1] == "summary" {
        run_summary(&config, &loader)?;
    } else {
        // UI mode (default)
        run_ui_mode(&config, &loader)?;
    }

    Ok(())
}

fn load(config: &DashboardConfig, loader: &DataLoader) -> Result<Dashboard> {
    println!("📂 Loading data from {}...", config.data_dir.display());
    Dashboard::load(config, loader).context("Failed to load dashboard data")
}

fn run_summary(config: &DashboardConfig, loader: &DataLoader) -> Result<()> {
    println!("🗺️  County Market Map - Data Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let dashboard = load(config, loader)?;
    let report = dashboard.report();

    println!("\n🔗 Join");
    println!("✓ Market rows read:        {}", report.market_rows);
    println!("✓ Rows in trailing window: {}", report.windowed_rows);
    println!("✓ Joined county rows:      {}", report.joined_rows);
    if report.unmatched_regions > 0 {
        println!("⚠️  Regions without a FIPS code: {}", report.unmatched_regions);
    }
    if report.without_geometry > 0 {
        println!("⚠️  Rows without a boundary:    {}", report.without_geometry);
    }
    if report.orphaned_boundaries > 0 {
        println!("⚠️  Boundaries never matched:   {}", report.orphaned_boundaries);
    }

    let options = dashboard.options();
    println!("\n🎛️  Filters");
    match (options.periods.last(), options.periods.first()) {
        (Some(first), Some(last)) => println!(
            "✓ Months: {} ({} → {})",
            options.periods.len(),
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ),
        _ => println!("✓ Months: 0"),
    }
    println!("✓ States: {}", options.states.len().saturating_sub(1));
    println!("✓ Property types: {}", options.property_types.len());

    let selection = dashboard.default_selection();
    let view = dashboard.view(&selection);
    println!("\n📊 Default view");
    println!("✓ {}", view.summary());
    match &view.choropleth.scale {
        Some(scale) => {
            let breaks: Vec<String> = scale
                .breaks
                .iter()
                .map(|b| county_market_map::localize_number(*b))
                .collect();
            println!("✓ {} breaks: {}", selection.metric, breaks.join(" | "));
        }
        None => println!("⚠️  No data for the default selection"),
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &DashboardConfig, loader: &DataLoader) -> Result<()> {
    println!("🖥️  Loading County Market Map UI...\n");

    let dashboard = load(config, loader)?;
    println!("✓ Joined {} county rows\n", dashboard.records().len());
    println!("Starting UI... (Press 'q' to quit)\n");

    // Create and run app
    let mut app = ui::App::new(&dashboard);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &DashboardConfig, _loader: &DataLoader) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the summary: county-market summary");
    eprintln!("   Or the web UI: cargo run --bin market-server --features server");
    std::process::exit(1);
}
