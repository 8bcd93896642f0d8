//! Dashboard clock text.
//!
//! Rendered as a Spanish long date with hours and minutes, for example
//! `lunes, 19 de octubre de 2026, 14:05`. The surfaces refresh it every
//! [`CLOCK_REFRESH_SECS`](crate::constants::CLOCK_REFRESH_SECS) seconds.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

pub fn clock_text(now: NaiveDateTime) -> String {
    format!(
        "{}, {} de {} de {}, {:02}:{:02}",
        weekday_name(now.weekday()),
        now.day(),
        MONTHS[now.month0() as usize],
        now.year(),
        now.hour(),
        now.minute()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn renders_spanish_long_date() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(14, 5, 59)
            .unwrap();
        assert_eq!(clock_text(now), "lunes, 19 de octubre de 2026, 14:05");
    }

    #[test]
    fn pads_hours_but_not_days() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap();
        assert_eq!(clock_text(now), "sábado, 1 de marzo de 2025, 07:00");
    }
}
