//! Billing-cycle window and the nested listing report.

use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;

use crate::model::Expense;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One expense as it appears in the listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub item: String,
    pub amount: f64,
    pub category: String,
    /// Time of day the record was created, `HH:MM:SS`.
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    pub day: u32,
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGroup {
    pub month: String,
    pub days: Vec<DayGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearGroup {
    pub year: i32,
    pub months: Vec<MonthGroup>,
}

/// Result payload of `list_expenses`: the current cycle grouped by
/// year → month name → day of month, plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseReport {
    pub cycle_start: NaiveDate,
    /// Sum of amounts inside the current billing cycle.
    pub cycle_total: f64,
    /// Sum of amounts over the unfiltered full history.
    pub total: f64,
    pub groups: Vec<YearGroup>,
}

/// Start of the billing cycle containing `today`: the anchor day in the
/// current month, shifted back one month while the anchor is still ahead
/// of us. Anchors past the end of a short month clamp to its last day.
#[must_use]
pub fn cycle_start(today: NaiveDate, billing_day: u32) -> NaiveDate {
    let (mut year, mut month) = (today.year(), today.month());
    if today.day() < billing_day {
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    let day = billing_day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(today)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(28, |d| d.day())
}

/// Group expenses by creation time into year → month → day buckets.
///
/// Input ordering (most recent first) is preserved inside every bucket
/// and across buckets; consecutive records sharing a date share a bucket.
#[must_use]
pub fn group_by_day(expenses: &[Expense]) -> Vec<YearGroup> {
    let mut groups: Vec<YearGroup> = Vec::new();

    for expense in expenses {
        let created = expense.created_at;
        let year = created.year();
        let month = MONTH_NAMES[created.month0() as usize];
        let day = created.day();

        let year_idx = match groups.iter().position(|g| g.year == year) {
            Some(i) => i,
            None => {
                groups.push(YearGroup {
                    year,
                    months: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let months = &mut groups[year_idx].months;
        let month_idx = match months.iter().position(|g| g.month == month) {
            Some(i) => i,
            None => {
                months.push(MonthGroup {
                    month: month.to_string(),
                    days: Vec::new(),
                });
                months.len() - 1
            }
        };
        let days = &mut months[month_idx].days;
        let day_idx = match days.iter().position(|g| g.day == day) {
            Some(i) => i,
            None => {
                days.push(DayGroup {
                    day,
                    entries: Vec::new(),
                });
                days.len() - 1
            }
        };

        days[day_idx].entries.push(ReportEntry {
            item: expense.item.clone(),
            amount: expense.amount,
            category: expense.category.clone(),
            time: format!(
                "{:02}:{:02}:{:02}",
                created.hour(),
                created.minute(),
                created.second()
            ),
        });
    }

    groups
}
