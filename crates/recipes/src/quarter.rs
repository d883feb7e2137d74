//! Calendar quarters for date-range filters.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format the CRM's filter forms accept.
pub const FORM_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quarter {
    pub year: i32,
    /// 1..=4
    pub index: u32,
}

impl Quarter {
    /// Quarter containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            index: (date.month() - 1) / 3 + 1,
        }
    }

    /// Quarter `offset` quarters away; negative looks back. Saturates at the
    /// ends of the `i32` year range.
    pub fn offset(self, offset: i32) -> Self {
        let ordinal = i64::from(self.year) * 4 + i64::from(self.index) - 1 + i64::from(offset);
        let year = ordinal.div_euclid(4);
        match i32::try_from(year) {
            Ok(year) => Self {
                year,
                index: ordinal.rem_euclid(4) as u32 + 1,
            },
            Err(_) if year < 0 => Self { year: i32::MIN, index: 1 },
            Err(_) => Self { year: i32::MAX, index: 4 },
        }
    }

    pub fn start(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, (self.index - 1) * 3 + 1, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn end(&self) -> NaiveDate {
        self.offset(1)
            .start()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    /// `Q<n>-<year>`
    pub fn name(&self) -> String {
        format!("Q{}-{}", self.index, self.year)
    }

    pub fn start_text(&self) -> String {
        self.start().format(FORM_DATE_FORMAT).to_string()
    }

    pub fn end_text(&self) -> String {
        self.end().format(FORM_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} - {})", self.name(), self.start_text(), self.end_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn quarter_bounds_and_names() {
        let q3 = Quarter::containing(date(2024, 8, 15));
        assert_eq!(q3.name(), "Q3-2024");
        assert_eq!(q3.start_text(), "01/07/2024");
        assert_eq!(q3.end_text(), "30/09/2024");

        let q1 = Quarter::containing(date(2024, 3, 31));
        assert_eq!(q1.end_text(), "31/03/2024");
        let q4 = Quarter::containing(date(2023, 10, 1));
        assert_eq!(q4.end_text(), "31/12/2023");
    }

    #[test]
    fn offsets_cross_year_boundaries() {
        let q1 = Quarter { year: 2024, index: 1 };
        assert_eq!(q1.offset(-1), Quarter { year: 2023, index: 4 });
        assert_eq!(q1.offset(-5), Quarter { year: 2022, index: 4 });
        assert_eq!(q1.offset(4), Quarter { year: 2025, index: 1 });
        assert_eq!(q1.offset(0), q1);
    }

    #[test]
    fn extreme_offsets_do_not_overflow() {
        let q2 = Quarter { year: 2024, index: 2 };
        assert_eq!(
            q2.offset(i32::MIN),
            Quarter { year: 2024 + i32::MIN / 4, index: 2 }
        );
        assert_eq!(q2.offset(i32::MAX).index, 1);
        let last = Quarter { year: i32::MAX, index: 4 };
        assert_eq!(last.offset(1), last);
        let first = Quarter { year: i32::MIN, index: 1 };
        assert_eq!(first.offset(-1), first);
    }

    #[test]
    fn display_includes_range() {
        let q2 = Quarter { year: 2025, index: 2 };
        assert_eq!(q2.to_string(), "Q2-2025 (01/04/2025 - 30/06/2025)");
    }
}
