//! HTML rendering of resolver outcomes.
//!
//! The core hands over structured outcomes; everything human-facing
//! (wording, emoji, truncation) lives here.

use std::fmt::Write;

use spendbot_core::{EntryFailure, Expense, ExpenseReport, Outcome};

/// Listings show at most this many rows before truncating.
const MAX_LISTING_ROWS: usize = 40;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn fmt_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

/// `📌 <b>item</b> (location) - amount [dd/mm hh:mm]`
fn format_expense(expense: &Expense) -> String {
    let location = expense
        .location
        .as_deref()
        .map(|loc| format!(" ({})", escape_html(loc)))
        .unwrap_or_default();
    format!(
        "📌 <b>{}</b>{location} - {} [{}]",
        escape_html(&expense.item),
        fmt_amount(expense.amount),
        expense.expense_date.format("%d/%m %H:%M"),
    )
}

#[must_use]
pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Saved {
            count,
            records,
            failures,
        } => format_saved(*count, records, failures),
        Outcome::Listing(report) => format_listing(report),
        Outcome::Updated { record } => {
            format!("<b>✅ Updated:</b>\n\n{}", format_expense(record))
        }
        Outcome::Deleted { record } => format!(
            "🗑️ <b>Deleted:</b> <s>{}</s> ({})",
            escape_html(&record.item),
            fmt_amount(record.amount),
        ),
        Outcome::DeletedMany { count } => {
            format!("🗑️ Deleted {count} matching records.")
        }
        Outcome::Cleared { count } => format!("🧹 All gone. {count} records deleted."),
        Outcome::ClarificationNeeded { question } => question
            .as_deref()
            .map_or_else(|| "I need a few more details.".to_string(), escape_html),
        Outcome::NotFound { term } => {
            format!("Couldn't find \"{}\".", escape_html(term))
        }
        Outcome::FutureDate { date } => {
            format!("❌ That date is in the future ({}).", date.format("%d/%m"))
        }
        Outcome::NoChange => "Nothing to change.".to_string(),
        Outcome::Unrecognized => "Sorry, I didn't understand that.".to_string(),
    }
}

fn format_saved(count: usize, records: &[Expense], failures: &[EntryFailure]) -> String {
    if count == 0 && failures.is_empty() {
        return "Nothing was recognized.".to_string();
    }

    let mut out = String::new();
    if count > 0 {
        out.push_str("<b>✅ Saved:</b>\n\n");
        for record in records {
            let _ = writeln!(out, "{}\n", format_expense(record));
        }
    }
    for failure in failures {
        match failure {
            EntryFailure::ItemTooShort { item } => {
                let _ = writeln!(
                    out,
                    "❌ <b>{}</b>: item name is too short.\n",
                    escape_html(item)
                );
            }
            EntryFailure::FutureDate { item, date } => {
                let _ = writeln!(
                    out,
                    "❌ <b>{}</b>: date is in the future ({}).\n",
                    escape_html(item),
                    date.format("%d/%m"),
                );
            }
        }
    }
    out.trim_end().to_string()
}

fn format_listing(report: &ExpenseReport) -> String {
    if report.groups.is_empty() {
        return "The ledger is empty.".to_string();
    }

    let total_rows: usize = report
        .groups
        .iter()
        .flat_map(|y| &y.months)
        .flat_map(|m| &m.days)
        .map(|d| d.entries.len())
        .sum();

    let mut out = format!(
        "📊 <b>Expenses since {}:</b>\n",
        report.cycle_start.format("%d/%m/%Y")
    );
    let mut shown = 0usize;

    'render: for year in &report.groups {
        let _ = writeln!(out, "\n<b>{}</b>", year.year);
        for month in &year.months {
            let _ = writeln!(out, "  <b>{}</b>", escape_html(&month.month));
            for day in &month.days {
                let _ = writeln!(out, "  {}:", day.day);
                for entry in &day.entries {
                    if shown == MAX_LISTING_ROWS {
                        break 'render;
                    }
                    let _ = writeln!(
                        out,
                        "  📌 <b>{}</b> - {} ({}) [{}]",
                        escape_html(&entry.item),
                        fmt_amount(entry.amount),
                        escape_html(&entry.category),
                        entry.time,
                    );
                    shown += 1;
                }
            }
        }
    }

    if total_rows > shown {
        let _ = writeln!(out, "\n<i>(showing {shown} of {total_rows})</i>");
    }
    let _ = write!(
        out,
        "\n🏁 <b>Cycle total: {}</b>\nAll-time total: {}",
        fmt_amount(report.cycle_total),
        fmt_amount(report.total),
    );
    out
}
