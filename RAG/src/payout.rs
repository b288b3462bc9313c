/// Indicative payouts in rupees, matched by substring against the procedure.
/// Longer, more specific names come before the generic ones they contain.
const ESTIMATED_PAYOUTS: &[(&str, u64)] = &[
    ("laparoscopic appendectomy", 40_000),
    ("tympanoplasty", 25_000),
    ("fissurectomy", 20_000),
    ("bariatric surgery", 120_000),
    ("dental extraction", 5_000),
    ("knee replacement", 180_000),
    ("fracture surgery", 60_000),
    ("appendectomy", 35_000),
    ("lipoma excision", 15_000),
    ("c-section", 45_000),
    ("cancer treatment", 200_000),
    ("heart bypass", 250_000),
    ("stroke hospitalization", 220_000),
    ("cataract surgery", 30_000),
];

/// Shown when no estimate is available.
pub const NO_AMOUNT: &str = "—";

pub fn estimate_payout(procedure: &str) -> Option<u64> {
    let procedure = procedure.to_lowercase();
    ESTIMATED_PAYOUTS
        .iter()
        .find(|(name, _)| procedure.contains(name))
        .map(|&(_, amount)| amount)
}

/// Formats rupees with Indian digit grouping, e.g. `₹1,80,000`.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = left;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();

    format!("₹{},{}", groups.join(","), last_three)
}

pub fn amount_for(procedure: Option<&str>) -> String {
    procedure
        .and_then(estimate_payout)
        .map(format_amount)
        .unwrap_or_else(|| NO_AMOUNT.to_string())
}
