//! Run reporting
//!
//! Outcomes are pushed to a [`Reporter`] while a run progresses. Rendering is
//! left to the caller and happens after the run has returned, so it cannot
//! affect what was applied.

use std::fmt;

use crate::migrations::{MigrationState, Outcome, OutcomeStatus};

/// Receives the outcome of every migration processed by a run, in order
pub trait Reporter: Send {
    fn record(&mut self, outcome: Outcome);
}

impl<F> Reporter for F
where
    F: FnMut(Outcome) + Send,
{
    fn record(&mut self, outcome: Outcome) {
        self(outcome)
    }
}

/// Accumulates outcomes and renders them as a two-column table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    outcomes: Vec<Outcome>,
}

impl MigrationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of outcomes with the given status
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// The outcome that stopped the run, if any
    pub fn failure(&self) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.status == OutcomeStatus::Failed)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Reporter for MigrationReport {
    fn record(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<(&str, &str)> = self
            .outcomes
            .iter()
            .map(|o| (o.id.as_str(), o.status.label()))
            .collect();
        write_table(f, ("MIGRATION", "STATUS"), &rows)
    }
}

/// Render `status` output: each discovered migration and whether it is applied
pub fn render_status(states: &[MigrationState]) -> String {
    struct StatusTable<'a>(&'a [MigrationState]);

    impl fmt::Display for StatusTable<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let rows: Vec<(&str, &str)> =
                self.0.iter().map(|s| (s.id.as_str(), s.label())).collect();
            write_table(f, ("MIGRATION", "STATUS"), &rows)
        }
    }

    StatusTable(states).to_string()
}

fn write_table(
    f: &mut fmt::Formatter<'_>,
    header: (&str, &str),
    rows: &[(&str, &str)],
) -> fmt::Result {
    let id_width = rows
        .iter()
        .map(|(id, _)| id.chars().count())
        .chain(std::iter::once(header.0.len()))
        .max()
        .unwrap_or(0);
    let status_width = rows
        .iter()
        .map(|(_, status)| status.len())
        .chain(std::iter::once(header.1.len()))
        .max()
        .unwrap_or(0);

    let border = format!(
        "+{}+{}+",
        "-".repeat(id_width + 2),
        "-".repeat(status_width + 2)
    );

    writeln!(f, "{}", border)?;
    writeln!(
        f,
        "| {:<id_width$} | {:<status_width$} |",
        header.0, header.1
    )?;
    writeln!(f, "{}", border)?;
    for (id, status) in rows {
        writeln!(f, "| {:<id_width$} | {:<status_width$} |", id, status)?;
    }
    writeln!(f, "{}", border)
}
