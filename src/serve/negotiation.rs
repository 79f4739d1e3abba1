//! `Accept-Encoding` negotiation against pre-compressed variants.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One entry of an `Accept-Encoding` header.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiationPreference {
    /// Encoding token, e.g. `gzip`
    pub name: String,

    /// Quality in `[0, 1]`; 1.0 when no `q` parameter is given
    pub weight: f32,
}

/// Parse an `Accept-Encoding` header into preferences, highest weight first.
///
/// Entries with equal weight keep their order from the header. Entries with
/// `q=0` (or an unparsable weight) are not acceptable and are dropped.
pub fn parse_accept_encoding(header: &str) -> Vec<NegotiationPreference> {
    let mut preferences: Vec<NegotiationPreference> = header
        .split(',')
        .filter_map(parse_preference)
        .filter(|p| p.weight > 0.0)
        .collect();

    // Stable sort keeps header order among equal weights
    preferences.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    preferences
}

fn parse_preference(segment: &str) -> Option<NegotiationPreference> {
    let mut parts = segment.split(';');
    let name = parts.next()?.trim();
    if name.is_empty() {
        return None;
    }

    let mut weight = 1.0;
    for param in parts {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim().eq_ignore_ascii_case("q") {
                weight = value
                    .trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|w| w.is_finite())
                    .map(|w| w.clamp(0.0, 1.0))
                    .unwrap_or(0.0);
            }
        }
    }

    Some(NegotiationPreference {
        name: name.to_string(),
        weight,
    })
}

/// Pick the most preferred encoding that has a variant in `available`.
///
/// Returns `None` when the header is empty or no listed encoding is
/// available; the caller then serves the canonical file.
pub fn negotiate<'a>(
    accept_encoding: &str,
    available: &'a BTreeMap<String, PathBuf>,
) -> Option<(&'a str, &'a Path)> {
    if available.is_empty() {
        return None;
    }

    parse_accept_encoding(accept_encoding)
        .into_iter()
        .find_map(|preference| {
            available
                .get_key_value(preference.name.as_str())
                .map(|(name, path)| (name.as_str(), path.as_path()))
        })
}
