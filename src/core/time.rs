use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| value.to_string())
}

pub(crate) fn first_of_month(value: Date) -> Date {
    Date::from_calendar_date(value.year(), value.month(), 1).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn format_date_is_iso() {
        let date = Date::from_calendar_date(2024, time::Month::September, 5).unwrap();
        assert_eq!(format_date(date), "2024-09-05");
    }

    #[test]
    fn first_of_month_resets_day() {
        let date = Date::from_calendar_date(2024, time::Month::September, 17).unwrap();
        assert_eq!(first_of_month(date).day(), 1);
        assert_eq!(first_of_month(date).month(), time::Month::September);
    }
}
