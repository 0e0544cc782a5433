use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Seconds in a day, for day-difference rounding
const SECONDS_PER_DAY: i64 = 86_400;

/// Viewports at or below this width count as mobile
const MOBILE_MAX_WIDTH: u32 = 768;

const MOBILE_USER_AGENTS: &[&str] = &[
    "android",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Parse an ISO date or date-time string into a UTC instant.
/// Bare dates are taken as midnight UTC.
fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Format a date string as `dd/mm/yyyy`.
/// Date-times keep the calendar day of their own offset.
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        dt.format("%d/%m/%Y").to_string()
    } else if let Some(dt) = parse_instant(date) {
        dt.format("%d/%m/%Y").to_string()
    } else {
        // Leading YYYY-MM-DD with trailing junk
        date.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| date.to_string())
    }
}

fn currency_symbol(currency: &str) -> String {
    match currency.to_ascii_uppercase().as_str() {
        "EUR" => "€".to_string(),
        "USD" => "US$".to_string(),
        "GBP" => "GB£".to_string(),
        other => other.to_string(),
    }
}

/// Spanish grouping: thousands separators only from five integer digits on.
fn group_thousands(digits: &str) -> String {
    if digits.len() < 5 {
        return digits.to_string();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Format an amount in Spanish locale style: `1234,50 US$`, `12.345,00 €`.
/// Always two decimals; a non-breaking space separates the symbol.
pub fn format_currency(amount: f64, currency: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    let integer = group_thousands(&(cents / 100).to_string());
    format!(
        "{}{},{:02}\u{a0}{}",
        sign,
        integer,
        cents % 100,
        currency_symbol(currency)
    )
}

/// Whole days between two dates, rounded up, regardless of order.
/// Returns None if either date can't be parsed.
pub fn calculate_days_between(start: &str, end: &str) -> Option<i64> {
    let start = parse_instant(start)?;
    let end = parse_instant(end)?;
    let seconds = (end - start).num_seconds().abs();
    Some((seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY)
}

/// Chart colour for an expense category, falling back to the "otros" colour.
pub fn category_color(category: &str) -> &'static str {
    match category {
        "transporte" => "#2196F3",
        "hospedaje" => "#4CAF50",
        "comida" => "#FF9800",
        "entretenimiento" => "#9C27B0",
        "compras" => "#F44336",
        _ => "#607D8B",
    }
}

/// Uppercase the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn is_mobile(viewport_width: u32, user_agent: &str) -> bool {
    if viewport_width <= MOBILE_MAX_WIDTH {
        return true;
    }
    let ua = user_agent.to_lowercase();
    MOBILE_USER_AGENTS.iter().any(|m| ua.contains(m))
}

/// Vibration length in milliseconds for a haptic feedback strength.
pub fn haptic_duration(kind: &str) -> Option<u32> {
    match kind {
        "light" => Some(10),
        "medium" => Some(50),
        "heavy" => Some(100),
        _ => None,
    }
}
