// 📄 Dashboard Page
// Server-rendered HTML: filter form, title, map container, metric panel.

use crate::dashboard::{Dashboard, DashboardView};
use crate::filter::{FilterOptions, FilterSelection};
use serde_json::json;

const STYLE: &str = include_str!("../web/dashboard.css");
const MAP_SCRIPT: &str = include_str!("../web/map.js");
const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

pub const TITLE: &str = "U.S. Real Estate Insights";

pub const ABOUT: &str = "This app is created using Redfin Data Center's open data \
(https://www.redfin.com/news/data-center/) to visualize various housing market metrics \
across the U.S. states at county level. Areas that are white on the map are the counties \
that don't have data available. Select the filters on the sidebar and your insights are \
just a couple clicks away. Hover over the map to view more details.";

pub const NO_DATA_NOTICE: &str = "No counties match the selected filters.";

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Query string reproducing `selection`
pub fn selection_query(selection: &FilterSelection) -> String {
    selection
        .to_form_pairs()
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn select_control(name: &str, label: &str, help: &str, choices: &[String], selected: &str) -> String {
    let options: String = choices
        .iter()
        .map(|choice| {
            let marker = if choice == selected { " selected" } else { "" };
            format!(
                "<option value=\"{v}\"{marker}>{v}</option>",
                v = escape_html(choice),
                marker = marker
            )
        })
        .collect();

    format!(
        "<label title=\"{help}\">{label}<select name=\"{name}\">{options}</select></label>",
        help = escape_html(help),
        label = escape_html(label),
        name = name,
        options = options
    )
}

fn filter_form(options: &FilterOptions, selection: &FilterSelection) -> String {
    let periods: Vec<String> = options
        .periods
        .iter()
        .map(|p| p.format("%Y-%m-%d").to_string())
        .collect();
    let property_types: Vec<String> = options.property_types.iter().map(|p| p.to_string()).collect();
    let metrics: Vec<String> = options.metrics.iter().map(|m| m.to_string()).collect();

    let mut form = String::from("<form method=\"get\" action=\"/\">");
    form.push_str(&select_control(
        "period",
        "Snapshot Month",
        "Choose by which time period you want to look at the metrics. The default is always the most recent month.",
        &periods,
        &selection.period.format("%Y-%m-%d").to_string(),
    ));
    form.push_str(&select_control(
        "property_type",
        "View by Property Type",
        "Select by which property type you want to look at the metrics. The default is all residential types.",
        &property_types,
        &selection.property_type,
    ));
    form.push_str(&select_control(
        "metric",
        "Select Housing Metrics",
        "You can view the map by different housing market metrics such as median sales price, homes sold, etc.",
        &metrics,
        selection.metric.label(),
    ));
    form.push_str(&select_control(
        "state",
        "Select State",
        "Select to either view the map for all the states or zoom into one state.",
        &options.states,
        selection.state.label(),
    ));
    form.push_str(&format!(
        "<label title=\"Drag the slider to select counties that sold at least x number of homes in the snapshot month.\">\
Sold &gt;= X Number of Homes\
<input type=\"range\" name=\"min_homes_sold\" min=\"{min}\" max=\"{max}\" value=\"{value}\" \
oninput=\"this.nextElementSibling.value = this.value\"><output>{value}</output></label>",
        min = options.min_homes_sold,
        max = options.max_homes_sold,
        value = selection.min_homes_sold
    ));
    form.push_str("<button type=\"submit\">Apply Filters</button></form>");
    form
}

/// JSON handed to the map script; `</` is escaped so it cannot end the tag.
fn map_payload(dashboard: &Dashboard, view: &DashboardView<'_>) -> String {
    let payload = json!({
        "settings": dashboard.settings(),
        "fills": view.choropleth.fills,
        "tooltips": view.tooltips,
        "hasData": view.choropleth.has_data(),
        "metric": view.choropleth.metric_label,
        "breaks": view.choropleth.scale.as_ref().map(|s| &s.breaks),
        "boundariesUrl": "/api/boundaries",
    });
    payload.to_string().replace("</", "<\\/")
}

pub fn render_page(dashboard: &Dashboard, view: &DashboardView<'_>) -> String {
    let selection = &view.selection;
    let notice = if view.choropleth.has_data() {
        String::new()
    } else {
        format!("<p class=\"notice\" id=\"no-data\">{}</p>", NO_DATA_NOTICE)
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="{leaflet_css}">
<style>{style}</style>
</head>
<body>
<aside class="sidebar">
<h2>Welcome!</h2>
<p>Select Filters:</p>
{form}
</aside>
<main>
<div class="title"><h1>{title}</h1><img src="/logo" width="150" alt="logo"></div>
<details><summary>About the App</summary><p>{about}</p></details>
<div class="columns">
<div id="map"></div>
<div class="panel">
<p><span style="color:black"><strong>Metric</strong>: {metric}</span></p>
{notice}
<p class="notice" id="map-error" hidden></p>
<p>{summary}</p>
<p><a href="/api/choropleth?{query}">Download this view as GeoJSON</a></p>
</div>
</div>
</main>
<script id="map-data" type="application/json">{payload}</script>
<script src="{leaflet_js}"></script>
<script>{script}</script>
</body>
</html>
"#,
        title = TITLE,
        leaflet_css = LEAFLET_CSS,
        style = STYLE,
        form = filter_form(dashboard.options(), selection),
        about = escape_html(ABOUT),
        metric = escape_html(selection.metric.label()),
        notice = notice,
        summary = escape_html(&view.summary()),
        query = escape_html(&selection_query(selection)),
        payload = map_payload(dashboard, view),
        leaflet_js = LEAFLET_JS,
        script = MAP_SCRIPT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::sample_dashboard;
    use crate::filter::FilterForm;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("O'Brien <b> & \"x\""), "O&#39;Brien &lt;b&gt; &amp; &quot;x&quot;");
    }

    #[test]
    fn test_selection_query_encodes_values() {
        let dashboard = sample_dashboard();
        let selection = dashboard
            .select(&FilterForm {
                property_type: Some("Condo/Co-op".to_string()),
                metric: Some("Homes Sold (YoY)".to_string()),
                ..Default::default()
            })
            .unwrap();

        let query = selection_query(&selection);

        assert!(query.starts_with("period=2021-09-01&"));
        assert!(query.contains("property_type=Condo%2FCo-op"));
        assert!(query.contains("metric=Homes%20Sold%20%28YoY%29"));
        assert!(query.contains("state=All%20States"));
        assert!(query.ends_with("min_homes_sold=10"));
    }

    #[test]
    fn test_page_lists_controls_and_metric() {
        let dashboard = sample_dashboard();
        let mut selection = dashboard.default_selection();
        selection.property_type = "Single Family Residential".to_string();
        let view = dashboard.view(&selection);

        let html = render_page(&dashboard, &view);

        assert!(html.contains("<title>U.S. Real Estate Insights</title>"));
        assert!(html.contains("<strong>Metric</strong>: Median Sales Price"));
        assert!(html.contains("<option value=\"2021-09-01\" selected>"));
        assert!(html.contains("<option value=\"Single Family Residential\" selected>"));
        assert!(html.contains("<option value=\"All States\" selected>"));
        assert!(html.contains("name=\"min_homes_sold\" min=\"1\" max=\"500\" value=\"10\""));
        assert!(html.contains("Apply Filters"));
        assert!(html.contains("About the App"));
        assert!(!html.contains("id=\"no-data\""));
        assert!(html.contains("\"37183\":\"#"));
    }

    #[test]
    fn test_empty_view_shows_notice() {
        let dashboard = sample_dashboard();
        let view = dashboard.view(&dashboard.default_selection());

        let html = render_page(&dashboard, &view);

        assert!(html.contains(NO_DATA_NOTICE));
        assert!(html.contains("\"hasData\":false"));
        assert!(html.contains("\"fills\":{}"));
    }

    #[test]
    fn test_payload_cannot_close_script_tag() {
        let dashboard = sample_dashboard();
        let mut selection = dashboard.default_selection();
        selection.property_type = "Single Family Residential".to_string();
        let mut view = dashboard.view(&selection);
        view.tooltips[0].rows[0].value = "</script><script>alert(1)</script>".to_string();

        let payload = map_payload(&dashboard, &view);

        assert!(!payload.contains("</script>"));
    }
}
