/*
 * This file is part of smcfan.
 *
 * Copyright (C) 2025 smcfan contributors
 *
 * smcfan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * smcfan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with smcfan. If not, see <https://www.gnu.org/licenses/>.
 */

//! Reduce a set of sensor readings to one representative temperature.
//!
//! The two hottest sensors are averaged: this biases the controller toward
//! the worst hotspot while a single noisy sensor can only move the result by
//! half its error. With one sensor the result is that sensor.

use crate::constants::thermal::{HOTTEST_SAMPLES, MILLIDEGREES_PER_DEGREE};
use crate::sensors::Reading;

/// Integer mean of the `min(2, N)` largest values
///
/// Returns `None` for an empty slice. Integer division truncates toward
/// zero, which is the floor for the non-negative temperatures seen in
/// practice.
pub fn mean_of_hottest(values: &[i32]) -> Option<i32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let top = &sorted[..HOTTEST_SAMPLES.min(sorted.len())];
    let sum: i64 = top.iter().map(|&v| i64::from(v)).sum();
    Some((sum / top.len() as i64) as i32)
}

/// Representative temperature in whole degrees Celsius
///
/// The mean is taken over the raw millidegree values and only then divided
/// down to degrees, so sub-degree precision survives the averaging step.
pub fn aggregate(readings: &[Reading]) -> Option<i32> {
    let values: Vec<i32> = readings.iter().map(|r| r.millidegrees).collect();
    mean_of_hottest(&values).map(|m| m / MILLIDEGREES_PER_DEGREE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SensorId;

    fn readings(values: &[i32]) -> Vec<Reading> {
        values
            .iter()
            .enumerate()
            .map(|(i, &millidegrees)| Reading { sensor: SensorId(i as u32), millidegrees })
            .collect()
    }

    #[test]
    fn test_top_two_of_three() {
        assert_eq!(mean_of_hottest(&[70, 75, 60]), Some(72));
    }

    #[test]
    fn test_single_sensor_passes_through() {
        assert_eq!(mean_of_hottest(&[64]), Some(64));
        assert_eq!(aggregate(&readings(&[64999])), Some(64));
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(mean_of_hottest(&[]), None);
        assert_eq!(aggregate(&[]), None);
    }

    #[test]
    fn test_order_does_not_matter() {
        assert_eq!(mean_of_hottest(&[60, 70, 75]), mean_of_hottest(&[75, 60, 70]));
    }

    #[test]
    fn test_ties_at_top() {
        assert_eq!(mean_of_hottest(&[80, 80, 20]), Some(80));
    }

    #[test]
    fn test_millidegree_mean_then_degrees() {
        // (75000 + 70000) / 2 = 72500 -> 72
        assert_eq!(aggregate(&readings(&[70000, 75000, 60000])), Some(72));
        // (71900 + 71900) / 2 = 71900 -> 71, the sub-degree part is dropped last
        assert_eq!(aggregate(&readings(&[71900, 71900])), Some(71));
        // whole-degree floors would give (71 + 72) / 2 = 71, millidegrees give 72
        assert_eq!(aggregate(&readings(&[71900, 72600])), Some(72));
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        assert_eq!(mean_of_hottest(&[i32::MAX, i32::MAX]), Some(i32::MAX));
    }
}
