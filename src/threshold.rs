// src/threshold.rs - Histogram-based automatic threshold selection

use serde::{Deserialize, Serialize};

/// Auto-threshold algorithm applied to a channel histogram
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Maximises between-class variance
    Otsu,
    /// Geometric distance from the line joining histogram peak and tail
    Triangle,
    /// Kapur-Sahoo-Wong maximum entropy
    MaxEntropy,
    /// Mean grey level
    Mean,
}

impl ThresholdMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ThresholdMethod::Otsu => "Otsu",
            ThresholdMethod::Triangle => "Triangle",
            ThresholdMethod::MaxEntropy => "MaxEntropy",
            ThresholdMethod::Mean => "Mean",
        }
    }

    /// Select a threshold bin from a histogram.
    ///
    /// Returns None when the histogram is empty or the method finds no split.
    pub fn select_bin(&self, histogram: &[u64]) -> Option<usize> {
        if histogram.iter().all(|&c| c == 0) {
            return None;
        }
        match self {
            ThresholdMethod::Otsu => otsu(histogram),
            ThresholdMethod::Triangle => triangle(histogram),
            ThresholdMethod::MaxEntropy => max_entropy(histogram),
            ThresholdMethod::Mean => mean(histogram),
        }
    }
}

/// Otsu's method over cumulative normalised moments.
///
/// Empty bins between two modes all score the same; the middle of such a
/// run of tied maxima is returned.
pub fn otsu(histogram: &[u64]) -> Option<usize> {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return None;
    }
    let term = 1.0 / total as f64;

    let mut below = 0u64;
    let mut first_moment = 0.0f64;
    let total_mean: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64 * term)
        .sum();

    let mut best: Option<(usize, usize)> = None;
    let mut max_bcv = 0.0f64;
    for (i, &count) in histogram.iter().enumerate() {
        below += count;
        first_moment += i as f64 * count as f64 * term;
        if below == 0 || below == total {
            continue;
        }

        let cumulative = below as f64 * term;
        let denom = cumulative * (1.0 - cumulative);
        let diff = total_mean * cumulative - first_moment;
        let bcv = diff * diff / denom;
        if bcv > max_bcv {
            max_bcv = bcv;
            best = Some((i, i));
        } else if bcv == max_bcv {
            // Extend the tie only while it is unbroken
            if let Some((_, last)) = best.as_mut() {
                if *last + 1 == i {
                    *last = i;
                }
            }
        }
    }
    best.map(|(first, last)| (first + last) / 2)
}

/// Triangle method (Zack et al.), run on the longer tail of the histogram
pub fn triangle(histogram: &[u64]) -> Option<usize> {
    let len = histogram.len();
    let mut data: Vec<f64> = histogram.iter().map(|&c| c as f64).collect();

    let mut min = data.iter().position(|&c| c > 0.0)?;
    if min > 0 {
        // anchor the line on the empty bin just before the data
        min -= 1;
    }
    let mut min2 = (1..len).rev().find(|&i| data[i] > 0.0).unwrap_or(0);
    if min2 < len - 1 {
        min2 += 1;
    }
    let mut max = 0;
    let mut peak = 0.0;
    for (i, &c) in data.iter().enumerate() {
        if c > peak {
            max = i;
            peak = c;
        }
    }

    // Work on the side with the longer tail; mirror if that is the right side.
    let inverted = (max as i64 - min as i64) < (min2 as i64 - max as i64);
    if inverted {
        data.reverse();
        min = len - 1 - min2;
        max = len - 1 - max;
    }

    if min == max {
        return Some(min);
    }

    let mut nx = data[max];
    let mut ny = min as f64 - max as f64;
    let norm = (nx * nx + ny * ny).sqrt();
    nx /= norm;
    ny /= norm;
    let d = nx * min as f64 + ny * data[min];

    let mut split = min;
    let mut split_distance = 0.0;
    for i in (min + 1)..=max {
        let distance = nx * i as f64 + ny * data[i] - d;
        if distance > split_distance {
            split = i;
            split_distance = distance;
        }
    }
    let split = split.saturating_sub(1);

    Some(if inverted { len - 1 - split } else { split })
}

/// Kapur-Sahoo-Wong maximum entropy threshold
pub fn max_entropy(histogram: &[u64]) -> Option<usize> {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return None;
    }
    let norm: Vec<f64> = histogram.iter().map(|&c| c as f64 / total as f64).collect();

    let mut p1 = Vec::with_capacity(norm.len());
    let mut acc = 0.0;
    for &p in &norm {
        acc += p;
        p1.push(acc);
    }
    let p2: Vec<f64> = p1.iter().map(|&p| 1.0 - p).collect();

    let first_bin = p1.iter().position(|p| p.abs() >= f64::EPSILON).unwrap_or(0);
    let last_bin = (first_bin..norm.len())
        .rev()
        .find(|&i| p2[i].abs() >= f64::EPSILON)
        .unwrap_or(norm.len() - 1);

    let mut best = None;
    let mut max_ent = f64::MIN_POSITIVE;
    for it in first_bin..=last_bin {
        let mut ent_back = 0.0;
        if p1[it] > 0.0 {
            for ih in 0..=it {
                if histogram[ih] != 0 {
                    let q = norm[ih] / p1[it];
                    ent_back -= q * q.ln();
                }
            }
        }

        let mut ent_obj = 0.0;
        if p2[it] > 0.0 {
            for ih in (it + 1)..norm.len() {
                if histogram[ih] != 0 {
                    let q = norm[ih] / p2[it];
                    ent_obj -= q * q.ln();
                }
            }
        }

        let total_ent = ent_back + ent_obj;
        if total_ent > max_ent {
            max_ent = total_ent;
            best = Some(it);
        }
    }
    best
}

/// Mean grey level, truncated to a bin index
pub fn mean(histogram: &[u64]) -> Option<usize> {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return None;
    }
    let weighted: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();
    Some((weighted / total as f64).floor() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bimodal() -> Vec<u64> {
        let mut hist = vec![0u64; 256];
        for i in 20..40 {
            hist[i] = 100;
        }
        for i in 180..200 {
            hist[i] = 60;
        }
        hist
    }

    #[test]
    fn otsu_splits_bimodal_between_modes() {
        let t = otsu(&bimodal()).unwrap();
        assert!((39..180).contains(&t), "threshold {} not between modes", t);
    }

    #[test]
    fn max_entropy_splits_bimodal_between_modes() {
        let t = max_entropy(&bimodal()).unwrap();
        assert!((39..180).contains(&t), "threshold {} not between modes", t);
    }

    #[test]
    fn triangle_sits_at_foot_of_peak() {
        // Tall background peak at low values with a long right tail
        let mut hist = vec![0u64; 256];
        hist[10] = 1000;
        hist[11] = 800;
        hist[12] = 400;
        for i in 13..120 {
            hist[i] = 20;
        }
        let t = triangle(&hist).unwrap();
        assert!(t > 10 && t < 60, "threshold {} not at foot of peak", t);
    }

    #[test]
    fn empty_histogram_has_no_threshold() {
        let hist = vec![0u64; 256];
        for method in [
            ThresholdMethod::Otsu,
            ThresholdMethod::Triangle,
            ThresholdMethod::MaxEntropy,
            ThresholdMethod::Mean,
        ] {
            assert_eq!(method.select_bin(&hist), None);
        }
    }

    #[test]
    fn single_bin_histogram_has_no_otsu_split() {
        let mut hist = vec![0u64; 256];
        hist[0] = 50;
        assert_eq!(otsu(&hist), None);
    }

    #[test]
    fn mean_of_two_spikes() {
        let mut hist = vec![0u64; 256];
        hist[0] = 1;
        hist[100] = 1;
        assert_eq!(mean(&hist), Some(50));
    }

    #[test]
    fn otsu_picks_middle_of_gap_between_spikes() {
        let mut hist = vec![0u64; 256];
        hist[0] = 30;
        hist[255] = 30;
        assert_eq!(otsu(&hist), Some(127));
    }
}
