//! Binary classification diagnostics logged after training

use std::fmt;

/// 2x2 confusion matrix; rows are the true class, columns the predicted class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[u8], predicted: &[u8]) -> Self {
        let mut cm = ConfusionMatrix::default();
        for (t, p) in truth.iter().zip(predicted) {
            match (*t, *p) {
                (0, 0) => cm.true_negatives += 1,
                (0, _) => cm.false_positives += 1,
                (_, 0) => cm.false_negatives += 1,
                _ => cm.true_positives += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    pub fn correct(&self) -> usize {
        self.true_negatives + self.true_positives
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[[{:>6} {:>6}]", self.true_negatives, self.false_positives)?;
        write!(f, " [{:>6} {:>6}]]", self.false_negatives, self.true_positives)
    }
}

/// Precision / recall / f1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassScores {
    fn new(true_pos: usize, false_pos: usize, false_neg: usize) -> Self {
        let precision = ratio(true_pos, true_pos + false_pos);
        let recall = ratio(true_pos, true_pos + false_neg);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassScores {
            precision,
            recall,
            f1,
            support: true_pos + false_neg,
        }
    }
}

/// Per-class scores plus accuracy, macro and weighted averages
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassificationReport {
    pub negative: ClassScores,
    pub positive: ClassScores,
    pub accuracy: f64,
    pub macro_avg: ClassScores,
    pub weighted_avg: ClassScores,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let negative = ClassScores::new(cm.true_negatives, cm.false_negatives, cm.false_positives);
        let positive = ClassScores::new(cm.true_positives, cm.false_positives, cm.false_negatives);
        let support = negative.support + positive.support;

        let macro_avg = ClassScores {
            precision: (negative.precision + positive.precision) / 2.0,
            recall: (negative.recall + positive.recall) / 2.0,
            f1: (negative.f1 + positive.f1) / 2.0,
            support,
        };

        let weighted = |neg: f64, pos: f64| {
            if support == 0 {
                0.0
            } else {
                (neg * negative.support as f64 + pos * positive.support as f64) / support as f64
            }
        };
        let weighted_avg = ClassScores {
            precision: weighted(negative.precision, positive.precision),
            recall: weighted(negative.recall, positive.recall),
            f1: weighted(negative.f1, positive.f1),
            support,
        };

        ClassificationReport {
            negative,
            positive,
            accuracy: cm.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }

    pub fn from_predictions(truth: &[u8], predicted: &[u8]) -> Self {
        Self::from_confusion(&ConfusionMatrix::from_predictions(truth, predicted))
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        write_scores(f, "0", &self.negative)?;
        write_scores(f, "1", &self.positive)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_scores(f, "macro avg", &self.macro_avg)?;
        write_scores(f, "weighted avg", &self.weighted_avg)
    }
}

fn write_scores(f: &mut fmt::Formatter<'_>, label: &str, s: &ClassScores) -> fmt::Result {
    writeln!(
        f,
        "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        label, s.precision, s.recall, s.f1, s.support
    )
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix_counts() {
        let truth = [0, 0, 1, 1, 1, 0];
        let preds = [0, 1, 1, 0, 1, 0];
        let cm = ConfusionMatrix::from_predictions(&truth, &preds);

        assert_eq!(cm.true_negatives, 2);
        assert_eq!(cm.false_positives, 1);
        assert_eq!(cm.false_negatives, 1);
        assert_eq!(cm.true_positives, 2);
        assert_eq!(cm.total(), 6);
        assert!((cm.accuracy() - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_scores() {
        // tn=3 fp=1 fn=2 tp=4
        let cm = ConfusionMatrix {
            true_negatives: 3,
            false_positives: 1,
            false_negatives: 2,
            true_positives: 4,
        };
        let report = ClassificationReport::from_confusion(&cm);

        assert!((report.positive.precision - 0.8).abs() < 1e-12);
        assert!((report.positive.recall - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(report.positive.support, 6);
        assert!((report.negative.precision - 0.6).abs() < 1e-12);
        assert!((report.negative.recall - 0.75).abs() < 1e-12);
        assert_eq!(report.negative.support, 4);
        assert!((report.accuracy - 0.7).abs() < 1e-12);
        assert_eq!(report.macro_avg.support, 10);

        let expected_weighted_recall = (0.75 * 4.0 + (4.0 / 6.0) * 6.0) / 10.0;
        assert!((report.weighted_avg.recall - expected_weighted_recall).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        let report = ClassificationReport::from_predictions(&[0, 0], &[0, 0]);
        assert_eq!(report.positive.precision, 0.0);
        assert_eq!(report.positive.recall, 0.0);
        assert_eq!(report.positive.f1, 0.0);
        assert_eq!(report.accuracy, 1.0);
    }

    #[test]
    fn test_display_contains_rows() {
        let report = ClassificationReport::from_predictions(&[0, 1], &[0, 1]);
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("accuracy"));
    }
}
