//! Parsers for the bracketed string formats routes are stored in on disk.
//!
//! | Function                   | Input example                                   |
//! |----------------------------|-------------------------------------------------|
//! | [`route_str_to_list`]      | `[[-8.58, 41.14], [-8.5, 41.1]]`                |
//! | [`points_str_to_list`]     | `[-8.58, 41.14], [-8.5, 41.1]`                  |
//! | [`timestamps_str_to_list`] | `[Timestamp('2020-01-01 10:00:00'), ...]`       |
//! | [`float_str_to_list`]      | `[1, 2.5, 0, 7]`                                |
//! | [`routes_str_to_list`]     | `[[[-8.58, 41.14], [-8.5, 41.1]], [[2, 2]]]`    |

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::point::{CoordinatesUnit, GeoReferenceSystem};
use crate::route::Route;
use crate::time::parse_timestamp;
use crate::{GeoError, GeoResult};

/// Parse a route string such as `[[-8.58, 41.14], [-8.5, 41.1]]` into
/// coordinate pairs.  Malformed input yields an empty list.
pub fn route_str_to_list(route_str: &str) -> Vec<[f64; 2]> {
    points_str_to_list(&route_str.replace("[[", "[").replace("]]", "]"))
}

/// Parse a comma-separated list of `[x, y]` pairs.  Whitespace is ignored
/// and empty pairs are skipped.  Malformed input is logged and yields an
/// empty list.
pub fn points_str_to_list(points_str: &str) -> Vec<[f64; 2]> {
    match parse_pairs(points_str) {
        Ok(pairs) => pairs,
        Err(e) => {
            warn!(error = %e, input = points_str, "could not parse point list");
            Vec::new()
        }
    }
}

/// Parse a list of quoted timestamps, optionally wrapped in `Timestamp(...)`.
pub fn timestamps_str_to_list(timestamps_str: &str) -> GeoResult<Vec<DateTime<Utc>>> {
    // Quoted sections sit at odd positions after splitting on the quote.
    timestamps_str
        .split(['\'', '"'])
        .skip(1)
        .step_by(2)
        .filter(|s| !s.trim().is_empty())
        .map(parse_timestamp)
        .collect()
}

/// Parse a bracketed list of numbers.
pub fn float_str_to_list(float_str: &str) -> GeoResult<Vec<f64>> {
    strip_whitespace(float_str)
        .replace(['[', ']'], "")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(parse_float)
        .collect()
}

/// Parse a bracketed list of routes.  Every point is `LatLon` in
/// `coordinates_unit`.  Empty routes are dropped.
pub fn routes_str_to_list(
    routes_str: &str,
    coordinates_unit: CoordinatesUnit,
) -> GeoResult<Vec<Route>> {
    let compact = strip_whitespace(routes_str);
    let inner = compact
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| GeoError::Parse(format!("expected a bracketed route list, got {routes_str:?}")))?;

    let mut routes = Vec::new();
    for group in top_level_groups(inner)? {
        let group_inner = &group[1..group.len() - 1];
        let pairs = parse_pairs(group_inner)?;
        if pairs.is_empty() {
            continue;
        }
        routes.push(Route::from_rows_with_units(
            &pairs,
            GeoReferenceSystem::LatLon,
            coordinates_unit,
        )?);
    }
    Ok(routes)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn parse_float(s: &str) -> GeoResult<f64> {
    s.parse::<f64>()
        .map_err(|e| GeoError::Parse(format!("{s:?} is not a number: {e}")))
}

/// Strict parser behind [`points_str_to_list`].
fn parse_pairs(points_str: &str) -> GeoResult<Vec<[f64; 2]>> {
    let compact = strip_whitespace(points_str);
    let mut pairs = Vec::new();
    for chunk in compact.split("],[") {
        let chunk = chunk.trim_matches(|c| c == '[' || c == ']');
        if chunk.is_empty() {
            continue;
        }
        let mut parts = chunk.split(',');
        // Values after the second are ignored; a missing side skips the pair.
        if let (Some(x), Some(y)) = (parts.next(), parts.next()) {
            if !x.is_empty() && !y.is_empty() {
                pairs.push([parse_float(x)?, parse_float(y)?]);
            }
        }
    }
    Ok(pairs)
}

/// Split `s` into its depth-0 bracketed groups, e.g. `"[a],[b]"` into
/// `["[a]", "[b]"]`.
fn top_level_groups(s: &str) -> GeoResult<Vec<&str>> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| GeoError::Parse(format!("unbalanced ']' in {s:?}")))?;
                if depth == 0 {
                    groups.push(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(GeoError::Parse(format!("unbalanced '[' in {s:?}")));
    }
    Ok(groups)
}
