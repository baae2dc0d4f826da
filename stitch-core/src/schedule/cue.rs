//! Pure segmentation and cue-point math. Durations are seconds throughout.

use crate::schedule::error::{ScheduleError, ScheduleResult};

/// Chunk a total duration into nominal-length segments. All segments equal
/// the nominal length except the last, which takes the remainder (or the
/// nominal length again when the total divides evenly).
pub fn plan_segments(total: f64, nominal: f64) -> ScheduleResult<Vec<f64>> {
    if nominal <= 0.0 {
        return Err(ScheduleError::InvalidNominalLength { nominal });
    }
    if total <= 0.0 {
        return Err(ScheduleError::InvalidTotalDuration { total });
    }
    let count = (total / nominal).ceil() as usize;
    let mut durations = vec![nominal; count - 1];
    durations.push(total - (count - 1) as f64 * nominal);
    Ok(durations)
}

/// Interior boundaries where an ad break is allowed. The boundary after
/// segment i is legal iff the elapsed time through it, (i+1)*nominal, leaves
/// strictly more than `min_last` of show still to play.
pub fn cue_points(total: f64, nominal: f64, min_last: f64) -> ScheduleResult<Vec<usize>> {
    let count = plan_segments(total, nominal)?.len();
    if count < 2 {
        return Ok(Vec::new());
    }
    Ok((0..count - 1)
        .filter(|index| (index + 1) as f64 * nominal < total - min_last)
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    InsertNow,
    DeferToEnd,
}

/// Unified insert-now vs defer-to-end policy. A mid-show break only makes
/// sense once enough show has elapsed and enough show remains to come back
/// to afterwards.
pub fn decide_break(
    elapsed_at_cue: f64,
    remaining: f64,
    split_threshold: f64,
    remainder_threshold: f64,
) -> BreakDecision {
    if elapsed_at_cue >= split_threshold && remaining > remainder_threshold {
        BreakDecision::InsertNow
    } else {
        BreakDecision::DeferToEnd
    }
}
