use crate::error::RollupError;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: String,
    pub end: String,
}

fn numeric_runs(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|run| !run.is_empty())
}

pub fn first_numeric_run(input: &str) -> Option<&str> {
    numeric_runs(input).next()
}

pub fn last_numeric_run(input: &str) -> Option<&str> {
    numeric_runs(input).last()
}

/// Range covered by an ordered list of constituents: first digit run of the
/// first entry, last digit run of the last entry. Entries in between are not
/// inspected and list order is trusted as chronological.
pub fn derive_range<S: AsRef<str>>(items: &[S]) -> Result<Range> {
    let (Some(first), Some(last)) = (items.first(), items.last()) else {
        anyhow::bail!("cannot derive a range from an empty list");
    };
    let first = first.as_ref();
    let last = last.as_ref();

    let start = first_numeric_run(first)
        .ok_or_else(|| RollupError::NoNumericToken(first.to_string()))?;
    let end =
        last_numeric_run(last).ok_or_else(|| RollupError::NoNumericToken(last.to_string()))?;

    Ok(Range {
        start: start.to_string(),
        end: end.to_string(),
    })
}

pub fn daily_tag(id: &str) -> String {
    format!("daily_{id}")
}

pub fn monthly_name(range: &Range) -> String {
    format!("monthly_{}_{}", range.start, range.end)
}

pub fn yearly_name(range: &Range) -> String {
    format!("yearly_{}_{}", range.start, range.end)
}

pub fn cold_storage_identifier(prefix: &str, range: &Range, timestamp: &str) -> String {
    format!("{prefix}_{}_{}_{timestamp}", range.start, range.end)
}
