use std::collections::{BTreeMap, HashSet};

use time::Date;

use crate::dates::format_iso_date;
use crate::insights::dto::{ActivityPoint, TrendPoint};

/// Supported aggregation windows; anything else falls back to 30 days.
pub fn window_days(requested: Option<i64>) -> i64 {
    match requested {
        Some(d @ (7 | 30 | 90)) => d,
        _ => 30,
    }
}

/// Groups samples by calendar day and averages each group. Output is
/// ascending by date and sparse: days without samples do not appear.
pub fn bucket_daily(samples: &[(Date, f64)]) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<Date, (f64, i64)> = BTreeMap::new();
    for (date, value) in samples {
        let entry = buckets.entry(*date).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(date, (sum, count))| TrendPoint {
            date: format_iso_date(date),
            avg: sum / count as f64,
            count,
        })
        .collect()
}

/// Per-day log counts across all log types, ascending and sparse.
pub fn daily_counts(dates: &[Date]) -> Vec<ActivityPoint> {
    let mut buckets: BTreeMap<Date, i64> = BTreeMap::new();
    for date in dates {
        *buckets.entry(*date).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(date, count)| ActivityPoint {
            date: format_iso_date(date),
            count,
        })
        .collect()
}

/// Consecutive days with at least one log, counting backwards. Today is
/// included when present but a quiet today does not break the run: a streak
/// ending yesterday is still alive.
pub fn current_streak(active_days: &HashSet<Date>, today: Date) -> u32 {
    let mut cursor = if active_days.contains(&today) {
        today
    } else {
        match today.previous_day() {
            Some(d) => d,
            None => return 0,
        }
    };
    let mut streak = 0;
    while active_days.contains(&cursor) {
        streak += 1;
        cursor = match cursor.previous_day() {
            Some(d) => d,
            None => break,
        };
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn window_days_allows_known_values_only() {
        assert_eq!(window_days(Some(7)), 7);
        assert_eq!(window_days(Some(90)), 90);
        assert_eq!(window_days(Some(14)), 30);
        assert_eq!(window_days(Some(-3)), 30);
        assert_eq!(window_days(None), 30);
    }

    #[test]
    fn bucket_daily_averages_per_day_ascending() {
        let samples = vec![
            (date!(2024 - 03 - 02), 4.0),
            (date!(2024 - 03 - 01), 2.0),
            (date!(2024 - 03 - 01), 4.0),
        ];
        let points = bucket_daily(&samples);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, "2024-03-01");
        assert_eq!(points[0].avg, 3.0);
        assert_eq!(points[0].count, 2);
        assert_eq!(points[1].date, "2024-03-02");
        assert_eq!(points[1].count, 1);
    }

    #[test]
    fn bucket_daily_is_sparse() {
        let samples = vec![
            (date!(2024 - 03 - 01), 5.0),
            (date!(2024 - 03 - 10), 1.0),
        ];
        let points = bucket_daily(&samples);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn daily_counts_tallies_each_day() {
        let dates = vec![
            date!(2024 - 03 - 02),
            date!(2024 - 03 - 01),
            date!(2024 - 03 - 02),
            date!(2024 - 03 - 02),
        ];
        let points = daily_counts(&dates);
        assert_eq!(
            points,
            vec![
                ActivityPoint {
                    date: "2024-03-01".to_string(),
                    count: 1
                },
                ActivityPoint {
                    date: "2024-03-02".to_string(),
                    count: 3
                },
            ]
        );
    }

    #[test]
    fn streak_counts_back_from_today() {
        let today = date!(2024 - 03 - 10);
        let days: HashSet<Date> = [
            date!(2024 - 03 - 10),
            date!(2024 - 03 - 09),
            date!(2024 - 03 - 08),
            // gap on the 7th
            date!(2024 - 03 - 06),
        ]
        .into_iter()
        .collect();
        assert_eq!(current_streak(&days, today), 3);
    }

    #[test]
    fn quiet_today_does_not_break_the_streak() {
        let today = date!(2024 - 03 - 10);
        let days: HashSet<Date> = [date!(2024 - 03 - 09), date!(2024 - 03 - 08)]
            .into_iter()
            .collect();
        assert_eq!(current_streak(&days, today), 2);
    }

    #[test]
    fn no_recent_activity_means_zero() {
        let today = date!(2024 - 03 - 10);
        let days: HashSet<Date> = [date!(2024 - 03 - 01)].into_iter().collect();
        assert_eq!(current_streak(&days, today), 0);
        assert_eq!(current_streak(&HashSet::new(), today), 0);
    }
}
