// County Market Map - Web Server
// Loads the market data once, then serves the choropleth dashboard.

use anyhow::{Context, Result};
use county_market_map::server::{build_router, AppState};
use county_market_map::{DashboardConfig, DataLoader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "county_market_map=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🌐 County Market Map - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = DashboardConfig::from_env()?;
    info!(data_dir = %config.data_dir.display(), "loading dashboard data");

    // Load + join happen once; requests only filter and render
    let loader = DataLoader::new();
    let state = AppState::load(&config, &loader).context("Failed to load dashboard data")?;
    let report = state.dashboard.report().clone();
    println!(
        "✓ Joined {} county-month rows ({} market rows in window)",
        report.joined_rows, report.windowed_rows
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   UI:  http://{}/", config.bind_addr);
    println!("   API: http://{}/api/counties", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
