pub mod cue;
pub mod cycler;
pub mod error;
pub mod timeline;

pub use cue::{cue_points, decide_break, plan_segments, BreakDecision};
pub use cycler::AdCycler;
pub use error::{ScheduleError, ScheduleResult};
pub use timeline::{
    build_show_timeline, trailing_ad, AdPlacement, OriginKind, SchedulePolicy, ShowTimeline,
    TimelineEntry,
};
