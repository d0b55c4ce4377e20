use chrono::{Local, NaiveDate};

/// Compile a regex once per process and hand out a `&'static` to it.
macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub(crate) use re;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Two-digit years are read as 20YY.
pub fn expand_year(y: i32) -> i32 {
    if y < 100 { 2000 + y } else { y }
}

/// Build a date from day/month/year numerals, rejecting impossible dates such as `31.02`.
pub fn day_month_year(day: &str, month: &str, year: i32) -> Option<NaiveDate> {
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `DD/MM/YYYY` or `DD/MM/YY`.
pub fn parse_slash_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().split('/');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || !(year.len() == 2 || year.len() == 4) {
        return None;
    }
    day_month_year(day, month, expand_year(year.parse().ok()?))
}

pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn slash_date_four_digit_year() {
        assert_eq!(parse_slash_date("12/01/2024"), Some(date(2024, 1, 12)));
    }

    #[test]
    fn slash_date_two_digit_year() {
        assert_eq!(parse_slash_date("05/03/25"), Some(date(2025, 3, 5)));
    }

    #[test]
    fn slash_date_rejects_impossible_dates() {
        assert_eq!(parse_slash_date("31/02/2024"), None);
        assert_eq!(parse_slash_date("12/13/2024"), None);
        assert_eq!(parse_slash_date("12/01/202"), None);
        assert_eq!(parse_slash_date("12/01"), None);
    }

    #[test]
    fn iso_date() {
        assert_eq!(parse_iso_date("2024-10-10"), Some(date(2024, 10, 10)));
        assert_eq!(parse_iso_date("10/10/2024"), None);
    }

    #[test]
    fn day_month_year_validates() {
        assert_eq!(day_month_year("05", "03", 2024), Some(date(2024, 3, 5)));
        assert_eq!(day_month_year("79", "00", 2024), None);
    }
}
