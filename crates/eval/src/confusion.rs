use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Counts of (true, predicted) label pairs.
///
/// Rows are true labels, columns predicted labels, both over the sorted
/// union of every label observed on either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_pairs<T, P>(pairs: &[(T, P)]) -> Self
    where
        T: AsRef<str>,
        P: AsRef<str>,
    {
        let labels: Vec<String> = pairs
            .iter()
            .flat_map(|(t, p)| [t.as_ref(), p.as_ref()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let n = labels.len();
        let mut counts = vec![vec![0usize; n]; n];
        for (t, p) in pairs {
            // Both sides are in `labels` by construction.
            if let (Some(row), Some(col)) = (index_of(&labels, t.as_ref()), index_of(&labels, p.as_ref())) {
                counts[row][col] += 1;
            }
        }

        Self { labels, counts }
    }

    pub fn index(&self, label: &str) -> Option<usize> {
        index_of(&self.labels, label)
    }

    /// Documents whose true label is `actual` and predicted label `predicted`.
    pub fn count(&self, actual: &str, predicted: &str) -> usize {
        match (self.index(actual), self.index(predicted)) {
            (Some(row), Some(col)) => self.counts[row][col],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }

    /// Row sum: documents truly carrying label `i`.
    pub fn support(&self, i: usize) -> usize {
        self.counts[i].iter().sum()
    }

    /// Column sum: documents predicted as label `i`.
    pub fn predicted_total(&self, i: usize) -> usize {
        self.counts.iter().map(|row| row[i]).sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }
}

fn index_of(labels: &[String], label: &str) -> Option<usize> {
    labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|l| l.len())
            .chain(std::iter::once(4))
            .max()
            .unwrap_or(4)
            + 2;

        write!(f, "{:width$}", "")?;
        for label in &self.labels {
            write!(f, "{label:>width$}")?;
        }
        writeln!(f)?;

        for (label, row) in self.labels.iter().zip(&self.counts) {
            write!(f, "{label:<width$}")?;
            for count in row {
                write!(f, "{count:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
