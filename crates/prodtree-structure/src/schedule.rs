//! Time-axis geometry for the schedule (Gantt) view.

use chrono::{Datelike, Duration, NaiveDate};
use prodtree_core::Item;
use prodtree_events::ZoomLevel;
use serde::Serialize;

/// Days added on each side of the data's own date span.
pub const RANGE_PADDING_DAYS: i64 = 7;

pub fn pixels_per_day(zoom: ZoomLevel) -> f32 {
    match zoom {
        ZoomLevel::Months => 3.0,
        ZoomLevel::Weeks => 12.0,
        ZoomLevel::Days => 28.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Inclusive day count.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

pub fn month_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.day0()))
}

pub fn next_month_start(day: NaiveDate) -> NaiveDate {
    month_start(month_start(day) + Duration::days(32))
}

pub fn month_end(day: NaiveDate) -> NaiveDate {
    next_month_start(day) - Duration::days(1)
}

/// Span covering every date on every item, padded by [`RANGE_PADDING_DAYS`].
///
/// Without any dates the range is the current month plus the next one.
pub fn date_range<'a, I>(items: I, today: NaiveDate) -> DateRange
where
    I: IntoIterator<Item = &'a Item>,
{
    let bounds = items
        .into_iter()
        .flat_map(Item::dates)
        .fold(None, |acc: Option<(NaiveDate, NaiveDate)>, day| match acc {
            Some((lo, hi)) => Some((lo.min(day), hi.max(day))),
            None => Some((day, day)),
        });

    match bounds {
        Some((lo, hi)) => DateRange {
            start: lo - Duration::days(RANGE_PADDING_DAYS),
            end: hi + Duration::days(RANGE_PADDING_DAYS),
        },
        None => DateRange {
            start: month_start(today),
            end: month_end(next_month_start(today)),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarGeometry {
    /// Signed distance from the axis start, in pixels.
    pub offset: f32,
    pub width: f32,
}

/// Pixel interval of `start..end` on an axis beginning at `axis_start`.
///
/// The width never drops below one day, so single-day work stays visible.
pub fn bar_geometry(
    axis_start: NaiveDate,
    start: NaiveDate,
    end: NaiveDate,
    pixels_per_day: f32,
) -> BarGeometry {
    let offset = (start - axis_start).num_days() as f32 * pixels_per_day;
    let width = ((end - start).num_days() as f32 * pixels_per_day).max(pixels_per_day);
    BarGeometry { offset, width }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickKind {
    Month,
    Day,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub date: NaiveDate,
    pub offset: f32,
    pub kind: TickKind,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NodeBars {
    pub planned: Option<BarGeometry>,
    pub actual: Option<BarGeometry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeAxis {
    pub range: DateRange,
    pub zoom: ZoomLevel,
    pub pixels_per_day: f32,
}

impl TimeAxis {
    pub fn new(range: DateRange, zoom: ZoomLevel) -> Self {
        Self {
            range,
            zoom,
            pixels_per_day: pixels_per_day(zoom),
        }
    }

    pub fn offset_of(&self, day: NaiveDate) -> f32 {
        (day - self.range.start).num_days() as f32 * self.pixels_per_day
    }

    pub fn total_width(&self) -> f32 {
        self.range.days() as f32 * self.pixels_per_day
    }

    pub fn bar(&self, start: NaiveDate, end: NaiveDate) -> BarGeometry {
        bar_geometry(self.range.start, start, end, self.pixels_per_day)
    }

    pub fn today_marker(&self, today: NaiveDate) -> Option<f32> {
        self.range
            .contains(today)
            .then(|| self.offset_of(today))
    }

    /// Planned bar from the effective dates; actual bar from the actual dates,
    /// running up to `today` while the work is still open.
    pub fn node_bars(&self, item: &Item, today: NaiveDate) -> NodeBars {
        let planned = match (item.effective_start(), item.effective_end()) {
            (Some(start), Some(end)) => Some(self.bar(start, end)),
            (Some(day), None) | (None, Some(day)) => Some(self.bar(day, day)),
            (None, None) => None,
        };

        let actual = item.actual_start.map(|start| {
            let end = match item.actual_end {
                Some(end) => end,
                None if item.status().is_completed() => start,
                None => today.max(start),
            };
            self.bar(start, end)
        });

        NodeBars { planned, actual }
    }

    /// Month labels for every calendar month the range touches.
    pub fn month_ticks(&self) -> Vec<AxisTick> {
        let mut ticks = Vec::new();
        let mut month = month_start(self.range.start);
        while month <= self.range.end {
            let date = month.max(self.range.start);
            ticks.push(AxisTick {
                date,
                offset: self.offset_of(date),
                kind: TickKind::Month,
                label: month.format("%b %Y").to_string(),
            });
            month = next_month_start(month);
        }
        ticks
    }

    /// Day markers for the finer zoom tiers; none at month zoom.
    pub fn day_ticks(&self) -> Vec<AxisTick> {
        let days: Vec<NaiveDate> = match self.zoom {
            ZoomLevel::Months => Vec::new(),
            ZoomLevel::Weeks => {
                let mut days = Vec::new();
                let mut month = month_start(self.range.start);
                while month <= self.range.end {
                    let last = month_end(month);
                    for day in [1, 10, 20, last.day()] {
                        if let Some(date) = month.with_day(day)
                            && self.range.contains(date)
                        {
                            days.push(date);
                        }
                    }
                    month = next_month_start(month);
                }
                days.dedup();
                days
            }
            ZoomLevel::Days => self.range.start.iter_days().take_while(|d| *d <= self.range.end).collect(),
        };

        days.into_iter()
            .map(|date| AxisTick {
                date,
                offset: self.offset_of(date),
                kind: TickKind::Day,
                label: date.format("%d").to_string(),
            })
            .collect()
    }

    pub fn ticks(&self) -> Vec<AxisTick> {
        let mut ticks = self.month_ticks();
        ticks.extend(self.day_ticks());
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodtree_core::{ManufacturingStatus, parse_day};
    use proptest::prelude::*;

    fn day(raw: &str) -> NaiveDate {
        parse_day(raw).unwrap()
    }

    #[test]
    fn test_range_is_padded_by_a_week() {
        let items = vec![
            Item {
                planned_start: Some(day("2024-02-10")),
                planned_end: Some(day("2024-02-20")),
                ..Item::new(1, "a")
            },
            Item {
                is_purchased: true,
                order_date: Some(day("2024-01-31")),
                required_date: Some(day("2024-03-05")),
                ..Item::new(2, "b")
            },
        ];
        let range = date_range(&items, day("2024-06-01"));
        assert_eq!(range.start, day("2024-01-24"));
        assert_eq!(range.end, day("2024-03-12"));
    }

    #[test]
    fn test_range_without_dates_is_current_and_next_month() {
        let range = date_range(&[Item::new(1, "a")], day("2024-01-17"));
        assert_eq!(range.start, day("2024-01-01"));
        assert_eq!(range.end, day("2024-02-29"));
    }

    #[test]
    fn test_month_helpers_cross_year() {
        assert_eq!(next_month_start(day("2023-12-31")), day("2024-01-01"));
        assert_eq!(month_end(day("2023-02-03")), day("2023-02-28"));
    }

    #[test]
    fn test_single_day_bar_keeps_one_day_width() {
        let geometry = bar_geometry(day("2024-01-01"), day("2024-01-05"), day("2024-01-05"), 12.0);
        assert_eq!(geometry.offset, 48.0);
        assert_eq!(geometry.width, 12.0);
    }

    #[test]
    fn test_bar_before_axis_has_negative_offset() {
        let geometry = bar_geometry(day("2024-01-10"), day("2024-01-05"), day("2024-01-15"), 2.0);
        assert_eq!(geometry.offset, -10.0);
        assert_eq!(geometry.width, 20.0);
    }

    #[test]
    fn test_today_marker_only_inside_range() {
        let axis = TimeAxis::new(
            DateRange {
                start: day("2024-01-01"),
                end: day("2024-01-31"),
            },
            ZoomLevel::Weeks,
        );
        assert_eq!(axis.today_marker(day("2024-01-02")), Some(12.0));
        assert_eq!(axis.today_marker(day("2024-01-31")), Some(360.0));
        assert_eq!(axis.today_marker(day("2024-02-01")), None);
        assert_eq!(axis.total_width(), 372.0);
    }

    #[test]
    fn test_month_ticks_span_range() {
        let axis = TimeAxis::new(
            DateRange {
                start: day("2024-01-24"),
                end: day("2024-03-12"),
            },
            ZoomLevel::Months,
        );
        let labels: Vec<String> = axis.month_ticks().into_iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
        assert!(axis.day_ticks().is_empty());
        assert_eq!(axis.month_ticks()[0].offset, 0.0);
    }

    #[test]
    fn test_week_zoom_marks_fixed_days() {
        let axis = TimeAxis::new(
            DateRange {
                start: day("2024-02-05"),
                end: day("2024-03-10"),
            },
            ZoomLevel::Weeks,
        );
        let dates: Vec<NaiveDate> = axis.day_ticks().into_iter().map(|t| t.date).collect();
        assert_eq!(
            dates,
            vec![
                day("2024-02-10"),
                day("2024-02-20"),
                day("2024-02-29"),
                day("2024-03-01"),
                day("2024-03-10"),
            ]
        );
    }

    #[test]
    fn test_day_zoom_marks_every_day() {
        let axis = TimeAxis::new(
            DateRange {
                start: day("2024-02-27"),
                end: day("2024-03-02"),
            },
            ZoomLevel::Days,
        );
        let labels: Vec<String> = axis.day_ticks().into_iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["27", "28", "29", "01", "02"]);
    }

    #[test]
    fn test_node_bars_for_open_and_finished_work() {
        let axis = TimeAxis::new(
            DateRange {
                start: day("2024-01-01"),
                end: day("2024-12-31"),
            },
            ZoomLevel::Months,
        );
        let open = Item {
            planned_start: Some(day("2024-01-11")),
            actual_start: Some(day("2024-01-21")),
            manufacturing_status: ManufacturingStatus::InProgress,
            ..Item::new(1, "open")
        };
        let bars = axis.node_bars(&open, day("2024-01-31"));
        assert_eq!(
            bars.planned,
            Some(BarGeometry {
                offset: 30.0,
                width: 3.0
            })
        );
        assert_eq!(
            bars.actual,
            Some(BarGeometry {
                offset: 60.0,
                width: 30.0
            })
        );

        let undated = axis.node_bars(&Item::new(2, "undated"), day("2024-01-31"));
        assert_eq!(undated, NodeBars::default());
    }

    proptest! {
        #[test]
        fn prop_bar_width_at_least_one_day(
            start_offset in -400i64..400,
            length in -30i64..400,
            ppd in 0.5f32..40.0,
        ) {
            let axis_start = day("2024-01-01");
            let start = axis_start + Duration::days(start_offset);
            let end = start + Duration::days(length);
            let geometry = bar_geometry(axis_start, start, end, ppd);
            prop_assert!(geometry.width >= ppd);
        }
    }
}
