//! Date helper functions

use chrono::{DateTime, Locale, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

fn is_portuguese(language: &str) -> bool {
    language.to_ascii_lowercase().starts_with("pt")
}

/// Locale for a site language such as `pt-BR` or `en`
fn locale(language: &str) -> Locale {
    let name = language.replace('-', "_");
    Locale::try_from(name.as_str()).unwrap_or(if is_portuguese(language) {
        Locale::pt_BR
    } else {
        Locale::en_US
    })
}

/// Format a publication date as `d MMM y` (e.g. "15 mar 2021")
pub fn format_date(date: &DateTime<Utc>, tz: Tz, language: &str) -> String {
    date.with_timezone(&tz)
        .format_localized("%-d %b %Y", locale(language))
        .to_string()
}

/// Format an edit marker (e.g. "* editado em 19 mar 2021, às 15:49")
pub fn format_edited(date: &DateTime<Utc>, tz: Tz, language: &str) -> String {
    let local = tz.from_utc_datetime(&date.naive_utc());
    let day = format_date(date, tz, language);
    if is_portuguese(language) {
        format!(
            "* editado em {}, às {:02}:{:02}",
            day,
            local.hour(),
            local.minute()
        )
    } else {
        format!(
            "* edited on {}, at {:02}:{:02}",
            day,
            local.hour(),
            local.minute()
        )
    }
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz2: TimeZone>(date: &DateTime<Tz2>) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
