// 🎨 Color Scale
// Quantile breakpoints over the filtered metric and the YlGn bucket ramp.
//
// Breaks sit at the 0/60/70/80/90/100th percentiles, so the top two deciles
// get most of the color resolution.

use serde::Serialize;

pub const BREAK_QUANTILES: [f64; 6] = [0.0, 0.6, 0.7, 0.8, 0.9, 1.0];

/// ColorBrewer YlGn, 5 classes, light to dark
pub const YLGN_5: [&str; 5] = ["#ffffcc", "#c2e699", "#78c679", "#31a354", "#006837"];

/// Fill for counties without a value in the current view
pub const NO_DATA_FILL: &str = "white";

/// Quantile of already-sorted values, linear between order statistics.
fn sorted_quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Breakpoints for the given values, ignoring NaN.
///
/// `None` when there is nothing to bucket.
pub fn quantile_breaks<I>(values: I) -> Option<Vec<f64>>
where
    I: IntoIterator<Item = f64>,
{
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    Some(
        BREAK_QUANTILES
            .iter()
            .map(|q| sorted_quantile(&sorted, *q))
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub breaks: Vec<f64>,
    pub colors: Vec<&'static str>,
}

impl ColorScale {
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        quantile_breaks(values).map(|breaks| ColorScale {
            breaks,
            colors: YLGN_5.to_vec(),
        })
    }

    /// Bin index for `value`: `breaks[i] <= value < breaks[i + 1]`, with the
    /// last break inclusive. Values outside the breaks have no bin.
    pub fn bucket(&self, value: f64) -> Option<usize> {
        let first = *self.breaks.first()?;
        let last = *self.breaks.last()?;
        if value.is_nan() || value < first || value > last {
            return None;
        }
        let bins = self.breaks.len() - 1;
        let idx = self.breaks.partition_point(|b| *b <= value);
        Some(idx.saturating_sub(1).min(bins - 1))
    }

    pub fn color(&self, value: Option<f64>) -> &'static str {
        value
            .and_then(|v| self.bucket(v))
            .and_then(|i| self.colors.get(i).copied())
            .unwrap_or(NO_DATA_FILL)
    }
}

/// Render a number the way an en-US locale would: grouped thousands and at
/// most three fraction digits.
pub fn localize_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && (int_part != "0" || !frac_part.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}
