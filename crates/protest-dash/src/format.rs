pub const MISSING_VALUE: &str = "\u{2014}";

pub const FILTERS_APPLIED_BADGE: &str = "Filters applied";
pub const ALL_AGENCIES_BADGE: &str = "All agencies";

pub fn pct(value: f64, digits: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.*}%", digits, value * 100.0)
}

pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_days(value: Option<f64>) -> String {
    match value.filter(|days| days.is_finite()) {
        Some(days) => format!("{} days", days.round() as i64),
        None => MISSING_VALUE.to_owned(),
    }
}

pub fn format_decimal(value: f64, digits: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", digits, value)
    } else {
        MISSING_VALUE.to_owned()
    }
}

pub fn filter_badge(filters_active: bool) -> &'static str {
    if filters_active {
        FILTERS_APPLIED_BADGE
    } else {
        ALL_AGENCIES_BADGE
    }
}

pub fn normalize_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}
