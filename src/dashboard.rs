// 🏠 Dashboard State
// Load and join once, then answer each selection with a fresh view.

use crate::boundaries::BoundarySet;
use crate::choropleth::{tooltip_layer, ChoroplethLayer, MapSettings, TooltipEntry};
use crate::config::DashboardConfig;
use crate::counties::CountyReference;
use crate::error::{LoadError, SelectionError};
use crate::filter::{apply_filters, FilterForm, FilterOptions, FilterSelection};
use crate::join::{join_all, JoinReport, JoinedRecord};
use crate::loader::DataLoader;
use crate::market::MarketRecord;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Joined table plus everything derived from it that never changes.
pub struct Dashboard {
    records: Vec<JoinedRecord>,
    options: FilterOptions,
    report: JoinReport,
    boundaries: Arc<BoundarySet>,
    settings: MapSettings,
}

/// Everything needed to draw one selection.
#[derive(Debug, Serialize)]
pub struct DashboardView<'a> {
    pub selection: FilterSelection,
    pub rows: Vec<&'a JoinedRecord>,
    pub choropleth: ChoroplethLayer,
    pub tooltips: Vec<TooltipEntry>,
}

impl DashboardView<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} counties | {} | {} | {} | sold >= {}",
            self.rows.len(),
            self.selection.period.format("%Y-%m-%d"),
            self.selection.property_type,
            self.selection.state.label(),
            self.selection.min_homes_sold
        )
    }
}

impl Dashboard {
    /// Read the three inputs named by `config` and join them.
    pub fn load(config: &DashboardConfig, loader: &DataLoader) -> Result<Self, LoadError> {
        let market = loader.market(&config.market_path())?;
        let counties = loader.counties(&config.county_path())?;
        let boundaries = loader.boundaries(&config.boundary_path())?;
        Ok(Self::from_parts(&market, &counties, boundaries))
    }

    pub fn from_parts(
        market: &[MarketRecord],
        counties: &[CountyReference],
        boundaries: Arc<BoundarySet>,
    ) -> Self {
        let (records, report) = join_all(market, counties, &boundaries);
        let options = FilterOptions::from_records(&records);
        info!(
            periods = options.periods.len(),
            states = options.states.len() - 1,
            "dashboard ready"
        );

        Dashboard {
            records,
            options,
            report,
            boundaries,
            settings: MapSettings::default(),
        }
    }

    pub fn records(&self) -> &[JoinedRecord] {
        &self.records
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn report(&self) -> &JoinReport {
        &self.report
    }

    pub fn boundaries(&self) -> &BoundarySet {
        &self.boundaries
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    pub fn default_selection(&self) -> FilterSelection {
        self.options.default_selection()
    }

    pub fn select(&self, form: &FilterForm) -> Result<FilterSelection, SelectionError> {
        FilterSelection::from_form(form, &self.options)
    }

    /// Filter and render for one selection.
    pub fn view(&self, selection: &FilterSelection) -> DashboardView<'_> {
        let rows = apply_filters(&self.records, selection);
        let choropleth = ChoroplethLayer::build(&rows, selection.metric);
        let tooltips = tooltip_layer(&rows);
        debug!(rows = rows.len(), metric = %selection.metric, "rendered view");

        DashboardView {
            selection: selection.clone(),
            rows,
            choropleth,
            tooltips,
        }
    }
}
