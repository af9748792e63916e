// libs/conversation-cell/src/services/dates.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;
use std::sync::OnceLock;

/// Parse the Spanish date expressions customers actually type: "hoy",
/// "mañana", a weekday name (next occurrence on or after today), or
/// "<día> de <mes>" (rolled to next year when already past). Anything else
/// is `None` and the conversation re-prompts.
pub fn parse_date_expr(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = input.trim().to_lowercase();

    match text.as_str() {
        "hoy" => return Some(today),
        "mañana" | "manana" => return Some(today + Duration::days(1)),
        _ => {}
    }

    if let Some(weekday) = weekday_from_name(&text) {
        let ahead = (weekday.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
        return Some(today + Duration::days(ahead));
    }

    let captures = day_of_month_re().captures(&text)?;
    let day: u32 = captures[1].parse().ok()?;
    let month = month_from_name(&captures[2])?;

    let candidate = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if candidate < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(candidate)
    }
}

fn day_of_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})\s+de\s+([a-záéíóúñ]+)$").expect("valid date pattern")
    })
}

fn weekday_from_name(text: &str) -> Option<Weekday> {
    match text {
        "lunes" => Some(Weekday::Mon),
        "martes" => Some(Weekday::Tue),
        "miércoles" | "miercoles" => Some(Weekday::Wed),
        "jueves" => Some(Weekday::Thu),
        "viernes" => Some(Weekday::Fri),
        "sábado" | "sabado" => Some(Weekday::Sat),
        "domingo" => Some(Weekday::Sun),
        _ => None,
    }
}

fn month_from_name(text: &str) -> Option<u32> {
    match text {
        "enero" => Some(1),
        "febrero" => Some(2),
        "marzo" => Some(3),
        "abril" => Some(4),
        "mayo" => Some(5),
        "junio" => Some(6),
        "julio" => Some(7),
        "agosto" => Some(8),
        "septiembre" => Some(9),
        "octubre" => Some(10),
        "noviembre" => Some(11),
        "diciembre" => Some(12),
        _ => None,
    }
}
