use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar bounds of one surveillance reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// Inclusive containment, used for event-dated records.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Inclusive range overlap, used for sales records: a shipment window that
    /// partially covers the reporting window still counts.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end && end >= self.start
    }

    /// Every calendar month touched by the window, in order.
    pub fn months(&self) -> Vec<MonthSpan> {
        let mut months = Vec::new();
        let mut year = self.start.year();
        let mut month = self.start.month();

        loop {
            months.push(MonthSpan { year, month });
            if year == self.end.year() && month == self.end.month() {
                break;
            }
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }

        months
    }

    pub fn month_count(&self) -> usize {
        self.months().len()
    }
}

/// One calendar month inside a reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthSpan {
    pub year: i32,
    pub month: u32,
}

impl MonthSpan {
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// Calendar-quarter key for a date, e.g. `2025-Q2`.
pub fn quarter_label(date: NaiveDate) -> String {
    let quarter = (date.month() - 1) / 3 + 1;
    format!("{:04}-Q{}", date.year(), quarter)
}
