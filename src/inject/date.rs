use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Formats tried after the numeric forms, in order.
const NAMED_FORMATS: [&str; 6] = [
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%b %d %Y",
];

/// Normalize a date string to the `YYYY-MM-DD` form date inputs expect.
///
/// Returns the input unchanged when no known form matches.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    parse_date(trimmed)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Some(date) = parse_numeric(s) {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NAMED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// `Y-M-D` with any of `-`, `/`, `.` as separator, or US `M/D/Y`.
fn parse_numeric(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split(['-', '/', '.']).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let num = |p: &str| p.parse::<u32>().ok();
    if parts[0].len() == 4 {
        let year = parts[0].parse::<i32>().ok()?;
        NaiveDate::from_ymd_opt(year, num(parts[1])?, num(parts[2])?)
    } else if parts[2].len() == 4 {
        let year = parts[2].parse::<i32>().ok()?;
        NaiveDate::from_ymd_opt(year, num(parts[0])?, num(parts[1])?)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpadded_components_are_padded() {
        assert_eq!(normalize_date("2024-3-5"), "2024-03-05");
        assert_eq!(normalize_date("2024/12/31"), "2024-12-31");
    }

    #[test]
    fn us_order_and_month_names() {
        assert_eq!(normalize_date("03/05/2024"), "2024-03-05");
        assert_eq!(normalize_date("March 5, 2024"), "2024-03-05");
        assert_eq!(normalize_date("5 Mar 2024"), "2024-03-05");
    }

    #[test]
    fn timestamps_keep_their_calendar_date() {
        assert_eq!(normalize_date("2024-03-05T23:30:00+02:00"), "2024-03-05");
    }

    #[test]
    fn unknown_input_is_kept() {
        assert_eq!(normalize_date("next tuesday"), "next tuesday");
        assert_eq!(normalize_date("2024-13-40"), "2024-13-40");
    }
}
