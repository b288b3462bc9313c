//! Extracts structured claim facts from free-text queries such as
//! `46M, knee surgery in Pune, 3-month-old insurance policy`.

use crate::models::ParsedQuery;
use regex::Regex;
use std::sync::LazyLock;

static RE_AGE_GENDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?P<age>\d{2})(?P<gender>[MF])").expect("age pattern"));
static RE_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*[- ]?months?").expect("duration pattern"));
static RE_PROCEDURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(surgery|operation|treatment|procedure|injury|fracture|therapy|scan|replacement)")
        .expect("procedure pattern")
});
static RE_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bin\s+([A-Z][a-zA-Z ]+)").expect("location pattern"));

pub fn parse_query(query: &str) -> ParsedQuery {
    let mut parsed = ParsedQuery::default();

    if let Some(caps) = RE_AGE_GENDER.captures(query) {
        parsed.age = Some(caps["age"].to_string());
        parsed.gender = Some(caps["gender"].to_uppercase());
    }

    if let Some(caps) = RE_DURATION.captures(query) {
        parsed.policy_duration_months = Some(caps[1].to_string());
    }

    // The procedure is the whole comma-separated clause holding the keyword,
    // so qualifiers like "knee" in "knee replacement" are kept for payout
    // lookup. A trailing "in <Place>" belongs to the location.
    if let Some(m) = RE_PROCEDURE.find(query) {
        let clause_start = query[..m.start()].rfind(',').map(|idx| idx + 1).unwrap_or(0);
        let tail = &query[clause_start..];
        let procedure = tail.split(',').next().unwrap_or(tail).trim();
        let procedure = RE_LOCATION
            .find(procedure)
            .map(|loc| procedure[..loc.start()].trim())
            .unwrap_or(procedure);
        if !procedure.is_empty() {
            parsed.procedure = Some(procedure.to_string());
        }
    }

    if let Some(caps) = RE_LOCATION.captures(query) {
        parsed.location = Some(caps[1].trim().to_string());
    }

    parsed
}
