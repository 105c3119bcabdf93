//! # 激活元素时间轴
//!
//! 在解析完成后一次性构建：把正文中所有带激活区间的元素的起止时刻收集为有序断点，
//! 并为每个断点预先算好 `[断点, 下一个断点)` 窗口内激活的元素集合。
//! 之后的每次查询只是一次二分查找。

use std::collections::BTreeSet;

use tracing::debug;

use crate::model::{ElementId, ElementSet, TimingInterval};
use crate::timestamp::snap_milliseconds;

/// 时间轴上的一个断点，以及从该断点开始到下一个断点之前激活的元素。
#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
    milliseconds: f64,
    active: ElementSet,
}

impl Breakpoint {
    #[must_use]
    pub const fn milliseconds(&self) -> f64 {
        self.milliseconds
    }

    #[must_use]
    pub const fn active(&self) -> &ElementSet {
        &self.active
    }
}

/// 按时间排序的断点序列。构建后不再修改，可以被任意多个调用方并发只读查询。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    breakpoints: Vec<Breakpoint>,
}

impl Timeline {
    /// 根据元素的激活区间构建时间轴，`intervals` 应按文档顺序排列。
    #[must_use]
    pub fn build(intervals: &[(ElementId, TimingInterval)]) -> Self {
        let mut instants: Vec<f64> = intervals
            .iter()
            .flat_map(|(_, interval)| [interval.begin_ms, interval.end_ms])
            .filter(|ms| ms.is_finite())
            .collect();
        instants.sort_by(f64::total_cmp);
        instants.dedup();

        let sorted_by = |instant: fn(&TimingInterval) -> f64| {
            let mut events: Vec<(f64, usize)> = intervals
                .iter()
                .enumerate()
                .map(|(index, (_, interval))| (instant(interval), index))
                .filter(|(ms, _)| ms.is_finite())
                .collect();
            events.sort_by(|a, b| a.0.total_cmp(&b.0));
            events
        };
        let starts = sorted_by(|interval| interval.begin_ms);
        let ends = sorted_by(|interval| interval.end_ms);

        // 扫描线：下标即文档顺序，BTreeSet 保证输出按文档顺序排列
        let mut active: BTreeSet<usize> = BTreeSet::new();
        let (mut next_start, mut next_end) = (0, 0);
        let mut breakpoints = Vec::with_capacity(instants.len());

        for milliseconds in instants {
            while let Some(&(end_ms, index)) = ends.get(next_end)
                && end_ms <= milliseconds
            {
                active.remove(&index);
                next_end += 1;
            }
            while let Some(&(begin_ms, index)) = starts.get(next_start)
                && begin_ms <= milliseconds
            {
                if intervals[index].1.contains(milliseconds) {
                    active.insert(index);
                }
                next_start += 1;
            }

            breakpoints.push(Breakpoint {
                milliseconds,
                active: active.iter().map(|&index| intervals[index].0).collect(),
            });
        }

        debug!(
            "[Timeline] 已从 {} 个计时元素构建 {} 个断点",
            intervals.len(),
            breakpoints.len()
        );

        Self { breakpoints }
    }

    #[must_use]
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// 找到不大于 `milliseconds` 的最后一个断点的激活集合。
    #[must_use]
    pub fn active_at_milliseconds(&self, milliseconds: f64) -> Option<&ElementSet> {
        let index = self
            .breakpoints
            .partition_point(|breakpoint| breakpoint.milliseconds <= milliseconds);
        index
            .checked_sub(1)
            .map(|i| &self.breakpoints[i].active)
    }

    /// 查询某一时刻（秒）激活的元素。时刻只对齐到微秒，不会取整到毫秒。
    ///
    /// 早于第一个断点或时间轴为空时返回空列表。
    #[must_use]
    pub fn active_elements(&self, time_seconds: f64) -> Vec<ElementId> {
        let milliseconds = snap_milliseconds(time_seconds * 1000.0);
        self.active_at_milliseconds(milliseconds)
            .map(ElementSet::to_vec)
            .unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.breakpoints.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(begin_ms: f64, end_ms: f64) -> TimingInterval {
        TimingInterval { begin_ms, end_ms }
    }

    #[test]
    fn test_two_paragraphs_do_not_overlap() {
        let first = ElementId(5);
        let second = ElementId(9);
        let timeline = Timeline::build(&[
            (first, interval(2000.0, 5760.0)),
            (second, interval(5800.0, 7720.0)),
        ]);

        let ms: Vec<f64> = timeline
            .breakpoints()
            .iter()
            .map(Breakpoint::milliseconds)
            .collect();
        assert_eq!(ms, vec![2000.0, 5760.0, 5800.0, 7720.0]);

        for t in [2.0, 3.5, 5.759] {
            assert_eq!(timeline.active_elements(t), vec![first], "t={t}");
        }
        for t in [5.8, 6.0, 7.719] {
            assert_eq!(timeline.active_elements(t), vec![second], "t={t}");
        }
        for t in [0.0, 1.999, 5.76, 5.77, 7.72, 8.0] {
            assert!(timeline.active_elements(t).is_empty(), "t={t}");
        }
    }

    #[test]
    fn test_query_time_is_not_rounded_to_whole_milliseconds() {
        let first = ElementId(1);
        let second = ElementId(2);
        let timeline = Timeline::build(&[
            (first, interval(2000.0, 5760.0)),
            (second, interval(5800.0, 7720.0)),
        ]);

        for t in [5.7596, 5.7599] {
            assert_eq!(timeline.active_elements(t), vec![first], "t={t}");
        }
        assert_eq!(timeline.active_elements(7.7196), vec![second]);
        for t in [1.9996, 5.7996] {
            assert!(!timeline.active_elements(t).contains(&second), "t={t}");
        }
        assert!(timeline.active_elements(1.9996).is_empty());
    }

    #[test]
    fn test_nested_and_open_ended_intervals() {
        let p = ElementId(1);
        let span = ElementId(2);
        let forever = ElementId(3);
        let timeline = Timeline::build(&[
            (p, interval(1000.0, 4000.0)),
            (span, interval(1500.0, 2000.0)),
            (forever, interval(3000.0, f64::INFINITY)),
        ]);

        assert_eq!(timeline.active_elements(1.0), vec![p]);
        assert_eq!(timeline.active_elements(1.5), vec![p, span]);
        assert_eq!(timeline.active_elements(3.0), vec![p, forever]);
        assert_eq!(timeline.active_elements(4.0), vec![forever]);
        assert_eq!(timeline.active_elements(100_000.0), vec![forever]);
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = Timeline::build(&[]);
        assert!(timeline.is_empty());
        assert!(timeline.active_elements(0.0).is_empty());
        assert!(timeline.active_elements(f64::NAN).is_empty());
    }

    #[test]
    fn test_zero_length_interval_is_never_active() {
        let timeline = Timeline::build(&[(ElementId(1), interval(1000.0, 1000.0))]);
        assert_eq!(timeline.breakpoints().len(), 1);
        assert!(timeline.active_elements(1.0).is_empty());
    }
}
