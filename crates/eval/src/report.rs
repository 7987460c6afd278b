use serde::{Deserialize, Serialize};
use std::fmt;

use crate::confusion::ConfusionMatrix;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class precision/recall/F1 plus accuracy and averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub total: usize,
}

impl ClassificationReport {
    /// Undefined ratios (zero denominators) report as 0.0.
    pub fn from_matrix(matrix: &ConfusionMatrix) -> Self {
        let classes: Vec<ClassMetrics> = matrix
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let tp = matrix.counts[i][i];
                let support = matrix.support(i);
                let precision = ratio(tp, matrix.predicted_total(i));
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let total = matrix.total();
        let n = classes.len();

        let macro_avg = if n == 0 {
            AverageMetrics::default()
        } else {
            AverageMetrics {
                precision: classes.iter().map(|c| c.precision).sum::<f64>() / n as f64,
                recall: classes.iter().map(|c| c.recall).sum::<f64>() / n as f64,
                f1: classes.iter().map(|c| c.f1).sum::<f64>() / n as f64,
            }
        };

        let weighted_avg = if total == 0 {
            AverageMetrics::default()
        } else {
            let weight = |c: &ClassMetrics| c.support as f64 / total as f64;
            AverageMetrics {
                precision: classes.iter().map(|c| c.precision * weight(c)).sum(),
                recall: classes.iter().map(|c| c.recall * weight(c)).sum(),
                f1: classes.iter().map(|c| c.f1 * weight(c)).sum(),
            }
        };

        Self {
            classes,
            accuracy: ratio(matrix.correct(), total),
            macro_avg,
            weighted_avg,
            total,
        }
    }

    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_report_for_missed_class() {
        let pairs = [("Invoice", "Invoice"), ("Contract", "Invoice"), ("Invoice", "Invoice")];
        let report = ClassificationReport::from_matrix(&ConfusionMatrix::from_pairs(&pairs));

        let invoice = report.class("Invoice").unwrap();
        assert!(approx(invoice.recall, 1.0));
        assert!(approx(invoice.precision, 2.0 / 3.0));
        assert!(approx(invoice.f1, 0.8));
        assert_eq!(invoice.support, 2);

        let contract = report.class("Contract").unwrap();
        assert!(approx(contract.recall, 0.0));
        assert!(approx(contract.precision, 0.0));
        assert!(approx(contract.f1, 0.0));
        assert_eq!(contract.support, 1);

        assert!(approx(report.accuracy, 2.0 / 3.0));
        assert!(approx(report.macro_avg.recall, 0.5));
        assert!(approx(report.weighted_avg.recall, 2.0 / 3.0));
        assert_eq!(report.total, 3);
    }

    #[test]
    fn test_perfect_predictions() {
        let pairs = [("Earnings", "Earnings"), ("Contract", "Contract")];
        let report = ClassificationReport::from_matrix(&ConfusionMatrix::from_pairs(&pairs));
        assert!(approx(report.accuracy, 1.0));
        assert!(report.classes.iter().all(|c| approx(c.f1, 1.0)));
    }

    #[test]
    fn test_empty_report() {
        let pairs: [(&str, &str); 0] = [];
        let report = ClassificationReport::from_matrix(&ConfusionMatrix::from_pairs(&pairs));
        assert!(report.classes.is_empty());
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.macro_avg, AverageMetrics::default());
    }

    #[test]
    fn test_display_contains_rows() {
        let pairs = [("Invoice", "Invoice"), ("Contract", "Invoice")];
        let text = ClassificationReport::from_matrix(&ConfusionMatrix::from_pairs(&pairs)).to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("Contract"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("0.50"));
    }
}
