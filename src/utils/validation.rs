//! Centralized validation and helper functions.

use std::collections::BTreeSet;

use crate::core::{FlowerId, GenomeGraph, Name, ROOT_EVENT_HEADER};

/// Maximum length of an event header
pub const MAX_HEADER_LENGTH: usize = 255;

/// Validate a reference event header supplied by the user.
///
/// Headers identify the event at every level, so they must be non-empty,
/// printable and distinct from the synthetic root event's header.
///
/// # Errors
///
/// Returns a description of the problem if the header is unusable.
///
/// # Examples
///
/// ```
/// use ref_threader::utils::validation::validate_event_header;
///
/// assert!(validate_event_header("reference").is_ok());
/// assert!(validate_event_header("").is_err());
/// assert!(validate_event_header("ROOT").is_err());
/// ```
pub fn validate_event_header(header: &str) -> Result<(), String> {
    if header.trim().is_empty() {
        return Err("Event header cannot be empty".to_string());
    }
    if header.len() > MAX_HEADER_LENGTH {
        return Err(format!(
            "Event header is {} bytes, maximum is {MAX_HEADER_LENGTH}",
            header.len()
        ));
    }
    if header.chars().any(char::is_control) {
        return Err("Event header contains control characters".to_string());
    }
    if header == ROOT_EVENT_HEADER {
        return Err(format!("{ROOT_EVENT_HEADER} is reserved for the root event"));
    }
    Ok(())
}

/// Compute a signature of the reference thread of `flower`.
///
/// The signature is computed by:
/// 1. Collecting every reference adjacency as a pair of end names, smaller first
/// 2. Sorting the pairs and joining them with commas
/// 3. Computing MD5 of the concatenated string
///
/// Two runs that thread the same adjacencies yield the same signature
/// regardless of cap or end creation order. An unthreaded flower yields an
/// empty string.
#[must_use]
pub fn compute_thread_signature(graph: &GenomeGraph, flower: FlowerId, reference: Name) -> String {
    let mut pairs: BTreeSet<(Name, Name)> = BTreeSet::new();
    for &end in &graph.flower(flower).ends {
        let Some(cap) = graph.cap_with_event(end, reference) else {
            continue;
        };
        let Some(adjacent) = graph.cap(cap).adjacency else {
            continue;
        };
        let a = graph.end(end).name;
        let b = graph.end(graph.cap(adjacent).end).name;
        pairs.insert((a.min(b), a.max(b)));
    }
    if pairs.is_empty() {
        return String::new();
    }

    let concatenated = pairs
        .iter()
        .map(|(a, b)| format!("{a}-{b}"))
        .collect::<Vec<_>>()
        .join(",");
    let digest = md5::compute(concatenated.as_bytes());
    format!("{digest:x}")
}
