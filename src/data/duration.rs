use super::peer::NEVER;

/// Unit word to seconds multiplier, finest first.
///
/// A bare number is assigned the unit matching its position counted from the
/// right, so the order of this table matters.
const UNITS: &[(&str, u64)] = &[
    ("second", 1),
    ("minute", 60),
    ("hour", 3_600),
    ("day", 86_400),
    ("year", 31_536_000),
];

/// Parse handshake age text like "1 minute, 5 seconds ago" into seconds.
///
/// Components are comma-separated, coarsest first. Text with no digits at all
/// (e.g. "(none)") parses to [`NEVER`]. `wg` reports a handshake within the
/// current second as "Now", which parses to `0`.
pub fn parse_handshake_age(text: &str) -> u64 {
    let text = text.trim();
    if text.eq_ignore_ascii_case("now") {
        return 0;
    }

    let components: Vec<(u64, &str)> = text
        .split(',')
        .filter_map(|component| leading_number(component).map(|value| (value, component)))
        .collect();

    if components.is_empty() {
        return NEVER;
    }

    components
        .iter()
        .rev()
        .enumerate()
        .filter_map(|(position, (value, component))| {
            let multiplier = unit_multiplier(component)
                .or_else(|| UNITS.get(position).map(|(_, multiplier)| *multiplier))?;
            Some(value.saturating_mul(multiplier))
        })
        .fold(0u64, u64::saturating_add)
}

/// First run of ASCII digits in a component.
fn leading_number(component: &str) -> Option<u64> {
    let start = component.find(|c: char| c.is_ascii_digit())?;
    let digits: String = component[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    // Saturate absurdly long digit runs instead of dropping the component
    Some(digits.parse().unwrap_or(u64::MAX))
}

fn unit_multiplier(component: &str) -> Option<u64> {
    component.split_whitespace().find_map(|word| {
        let word = word.to_ascii_lowercase();
        UNITS
            .iter()
            .find(|(unit, _)| word.starts_with(unit))
            .map(|(_, multiplier)| *multiplier)
    })
}

/// Format an age for display, e.g. "1d 2h 3m 4s".
pub fn format_age(secs: u64) -> String {
    if secs == NEVER {
        return "never".to_string();
    }
    if secs == 0 {
        return "0s".to_string();
    }

    let mut parts = Vec::new();
    let mut remaining = secs;
    for (suffix, multiplier) in [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        let value = remaining / multiplier;
        remaining %= multiplier;
        if value > 0 {
            parts.push(format!("{}{}", value, suffix));
        }
    }
    parts.join(" ")
}
