use std::collections::BTreeMap;

use chrono::NaiveDate;
use vaxstat_core::LinelistRecord;

/// Linelist records grouped by event date, built once per run.
pub struct DateIndex<'a> {
    by_date: BTreeMap<NaiveDate, Vec<&'a LinelistRecord>>,
    len: usize,
}

impl<'a> DateIndex<'a> {
    pub fn new(records: &'a [LinelistRecord]) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<&'a LinelistRecord>> = BTreeMap::new();
        for record in records {
            by_date.entry(record.date).or_default().push(record);
        }
        Self {
            by_date,
            len: records.len(),
        }
    }

    /// Records with event date `date`; empty when there are none.
    pub fn on(&self, date: NaiveDate) -> &[&'a LinelistRecord] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records with event date in `start..=end`.
    pub fn between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &'a LinelistRecord> + '_ {
        self.by_date
            .range(start..=end)
            .flat_map(|(_, records)| records.iter().copied())
    }

    /// First and last event dates.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = *self.by_date.keys().next()?;
        let last = *self.by_date.keys().next_back()?;
        Some((first, last))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
