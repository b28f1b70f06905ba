//! Ranking metrics for scored predictions.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToxicnnError};
use crate::types::{LABEL_NAMES, LabelSet, NUM_LABELS};

/// Area under the ROC curve of `scores` against binary `positives`.
///
/// Computed from the Mann-Whitney rank statistic with tied scores sharing
/// their average rank. Returns `None` when the lengths differ or either
/// class is absent, since the curve is undefined then.
pub fn roc_auc(scores: &[f32], positives: &[bool]) -> Option<f64> {
    if scores.len() != positives.len() {
        return None;
    }
    let n_pos = positives.iter().filter(|&&p| p).count();
    let n_neg = positives.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut pos_rank_sum = 0.0f64;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based: positions start..end share (start + 1 + end) / 2
        let rank = (start + 1 + end) as f64 / 2.0;
        let tied_pos = order[start..end].iter().filter(|&&i| positives[i]).count();
        pos_rank_sum += rank * tied_pos as f64;
        start = end;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Per-label ROC AUC and their mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAuc {
    /// AUC of each label column, `None` where the column has a single class.
    pub per_label: Vec<LabelAuc>,
    /// Mean over the defined columns.
    pub mean: Option<f64>,
}

/// ROC AUC of one label column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelAuc {
    /// Label column name.
    pub label: String,
    /// Area under the curve.
    pub auc: Option<f64>,
}

/// Mean column-wise ROC AUC of `scores` against `truth`.
///
/// # Errors
///
/// Returns `ToxicnnError::ShapeMismatch` if the two have different lengths.
pub fn column_auc(scores: &[[f32; NUM_LABELS]], truth: &[LabelSet]) -> Result<ColumnAuc> {
    if scores.len() != truth.len() {
        return Err(ToxicnnError::ShapeMismatch(format!(
            "{} score rows but {} label rows",
            scores.len(),
            truth.len()
        )));
    }

    let per_label: Vec<LabelAuc> = (0..NUM_LABELS)
        .map(|col| {
            let column: Vec<f32> = scores.iter().map(|row| row[col]).collect();
            let positives: Vec<bool> = truth.iter().map(|l| l.0[col] >= 0.5).collect();
            LabelAuc {
                label: LABEL_NAMES[col].to_string(),
                auc: roc_auc(&column, &positives),
            }
        })
        .collect();

    let defined: Vec<f64> = per_label.iter().filter_map(|l| l.auc).collect();
    let mean = if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    };

    Ok(ColumnAuc { per_label, mean })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    #[test]
    fn perfect_and_inverted_ranking() {
        let positives = [false, false, true, true];
        assert_eq!(roc_auc(&[0.1, 0.2, 0.8, 0.9], &positives), Some(1.0));
        assert_eq!(roc_auc(&[0.9, 0.8, 0.2, 0.1], &positives), Some(0.0));
    }

    #[test]
    fn ties_count_half() {
        assert_eq!(roc_auc(&[0.5, 0.5], &[false, true]), Some(0.5));

        let scores = [0.1, 0.4, 0.35, 0.8];
        let positives = [false, false, true, true];
        // positive 0.35 beats 0.1 loses to 0.4; positive 0.8 beats both: 3/4
        assert_eq!(roc_auc(&scores, &positives), Some(0.75));
    }

    #[test]
    fn single_class_is_undefined() {
        assert_eq!(roc_auc(&[0.1, 0.2], &[true, true]), None);
        assert_eq!(roc_auc(&[0.1, 0.2], &[false, false]), None);
        assert_eq!(roc_auc(&[0.1], &[true, false]), None);
    }

    #[test]
    fn column_auc_averages_defined_columns() {
        let toxic = LabelSet::from_active(&[Label::Toxic]);
        let clean = LabelSet::clean();
        let mut hi = [0.0f32; NUM_LABELS];
        hi[0] = 0.9;
        let mut lo = [0.0f32; NUM_LABELS];
        lo[0] = 0.1;

        let result = column_auc(&[hi, lo], &[toxic, clean]).unwrap();
        assert_eq!(result.per_label[0].label, "toxic");
        assert_eq!(result.per_label[0].auc, Some(1.0));
        assert!(result.per_label[1..].iter().all(|l| l.auc.is_none()));
        assert_eq!(result.mean, Some(1.0));
    }

    #[test]
    fn column_auc_rejects_length_mismatch() {
        assert!(column_auc(&[[0.0; NUM_LABELS]], &[]).is_err());
    }
}
