// 📊 Summary statistics over the Value column (missing entries ignored)

use serde::Serialize;

/// Mean / max / min of the non-missing values.
///
/// All three are `None` when no value is present (empty slice or all missing);
/// they display as `NaN`, never panic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

impl SummaryStats {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut count = 0;
        let mut missing = 0;
        let mut sum = 0.0;
        let mut max: Option<f64> = None;
        let mut min: Option<f64> = None;

        for value in values {
            match value {
                Some(v) => {
                    count += 1;
                    sum += v;
                    max = Some(max.map_or(v, |m| m.max(v)));
                    min = Some(min.map_or(v, |m| m.min(v)));
                }
                None => missing += 1,
            }
        }

        SummaryStats {
            count,
            missing,
            mean: (count > 0).then(|| sum / count as f64),
            max,
            min,
        }
    }

    pub fn mean_display(&self) -> String {
        fmt2(self.mean)
    }

    pub fn max_display(&self) -> String {
        fmt2(self.max)
    }

    pub fn min_display(&self) -> String {
        fmt2(self.min)
    }
}

/// Two decimals, `NaN` for undefined.
pub fn fmt2(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "NaN".to_string(),
    }
}

/// Arithmetic mean of the present values, `None` if there are none.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    SummaryStats::from_values(values).mean
}

// ============================================================================
// BOX PLOT
// ============================================================================

/// Five-number summary with Tukey whiskers (1.5 × IQR), quartiles by linear
/// interpolation between closest ranks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxSummary {
    pub fn from_values(values: &[f64]) -> Option<BoxSummary> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
        let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
        let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(BoxSummary {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            outliers,
        })
    }
}

/// `sorted` must be non-empty and ascending.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_skip_missing() {
        let stats = SummaryStats::from_values(vec![Some(5.2), None, Some(7.1)]);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.max, Some(7.1));
        assert_eq!(stats.min, Some(5.2));
        assert_eq!(stats.mean_display(), "6.15");
    }

    #[test]
    fn test_stats_all_missing_is_undefined() {
        let stats = SummaryStats::from_values(vec![None, None]);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.max, None);
        assert_eq!(stats.min, None);
        assert_eq!(stats.mean_display(), "NaN");

        let empty = SummaryStats::from_values(Vec::new());
        assert_eq!(empty.count, 0);
        assert_eq!(empty.min_display(), "NaN");
    }

    #[test]
    fn test_two_decimal_display() {
        assert_eq!(fmt2(Some(4.0)), "4.00");
        assert_eq!(fmt2(Some(12.3456)), "12.35");
    }

    #[test]
    fn test_box_summary() {
        let summary = BoxSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.upper_whisker, 4.0);
        assert_eq!(summary.outliers, vec![100.0]);

        assert!(BoxSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_box_single_value() {
        let summary = BoxSummary::from_values(&[7.5]).unwrap();
        assert_eq!(summary.q1, 7.5);
        assert_eq!(summary.upper_whisker, 7.5);
        assert!(summary.outliers.is_empty());
    }
}
