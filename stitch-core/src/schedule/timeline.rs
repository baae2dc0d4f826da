use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::asset::{MediaAsset, Segment};
use crate::config::StitchConfig;
use crate::schedule::cue::{cue_points, decide_break, plan_segments, BreakDecision};
use crate::schedule::cycler::AdCycler;
use crate::schedule::error::{ScheduleError, ScheduleResult};

/// Probed segment durations drift from the nominal plan; anything beyond
/// this against a declared asset duration means the inputs are unusable.
const DURATION_TOLERANCE_SEC: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    Show,
    Ad,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub segment: Segment,
    pub origin_id: String,
    pub origin_kind: OriginKind,
}

/// Where the show's drawn ad ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "position")]
pub enum AdPlacement {
    MidShow { ad_id: String, cue_index: usize },
    EndOfShow { ad_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowTimeline {
    pub entries: Vec<TimelineEntry>,
    pub placement: Option<AdPlacement>,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulePolicy {
    pub nominal_segment_sec: f64,
    pub split_threshold_sec: f64,
    pub min_last_segment_sec: f64,
    pub defer_remainder_sec: f64,
}

impl SchedulePolicy {
    pub fn from_config(config: &StitchConfig) -> Self {
        Self {
            nominal_segment_sec: config.segment_duration_sec as f64,
            split_threshold_sec: config.cue_interval_sec as f64,
            min_last_segment_sec: config.min_last_segment_sec as f64,
            defer_remainder_sec: config.defer_remainder_sec as f64,
        }
    }
}

/// Order one show's segments together with at most one ad drawn from the
/// cycler. The cycler advances exactly once per show while the pool is
/// non-empty, regardless of where the ad lands.
pub fn build_show_timeline(
    show: &MediaAsset,
    show_segments: &[Segment],
    cycler: &mut AdCycler,
    ad_segments: &HashMap<String, Vec<Segment>>,
    policy: &SchedulePolicy,
) -> ScheduleResult<ShowTimeline> {
    if show_segments.is_empty() {
        return Err(ScheduleError::EmptySegments {
            asset_id: show.id.clone(),
        });
    }
    let total = resolve_total(show, show_segments)?;
    // Validates the nominal length and total duration as a side effect.
    let planned = plan_segments(total, policy.nominal_segment_sec)?;
    if planned.len() != show_segments.len() {
        debug!(
            asset_id = %show.id,
            planned = planned.len(),
            actual = show_segments.len(),
            "segmenter chunk count differs from nominal plan"
        );
    }

    let entries = entries_for(show_segments, OriginKind::Show);
    let Some(ad) = cycler.select_next().cloned() else {
        return Ok(ShowTimeline {
            entries,
            placement: None,
        });
    };
    let ad_entries = ad_segments
        .get(&ad.id)
        .filter(|segments| !segments.is_empty())
        .map(|segments| entries_for(segments, OriginKind::Ad))
        .ok_or_else(|| ScheduleError::MissingAdSegments {
            asset_id: ad.id.clone(),
        })?;

    let cues = cue_points(total, policy.nominal_segment_sec, policy.min_last_segment_sec)?;
    let chosen = cues
        .iter()
        .copied()
        .find(|cue| (cue + 1) as f64 * policy.nominal_segment_sec >= policy.split_threshold_sec)
        // Cues index the nominal plan; never split past the chunks we have.
        .filter(|cue| cue + 1 < entries.len());

    let (ordered, placement) = match chosen {
        Some(cue) => {
            let elapsed = (cue + 1) as f64 * policy.nominal_segment_sec;
            match decide_break(
                elapsed,
                total - elapsed,
                policy.split_threshold_sec,
                policy.defer_remainder_sec,
            ) {
                BreakDecision::InsertNow => {
                    debug!(asset_id = %show.id, ad_id = %ad.id, cue, elapsed, "mid-show ad break");
                    let mut ordered = Vec::with_capacity(entries.len() + ad_entries.len());
                    ordered.extend_from_slice(&entries[..=cue]);
                    ordered.extend(ad_entries);
                    ordered.extend_from_slice(&entries[cue + 1..]);
                    (
                        ordered,
                        AdPlacement::MidShow {
                            ad_id: ad.id.clone(),
                            cue_index: cue,
                        },
                    )
                }
                BreakDecision::DeferToEnd => {
                    deferred(entries, ad_entries, &show.id, &ad.id, "short remainder")
                }
            }
        }
        None => deferred(entries, ad_entries, &show.id, &ad.id, "no legal cue point"),
    };

    Ok(ShowTimeline {
        entries: ordered,
        placement: Some(placement),
    })
}

/// One trailing ad closing out the whole batch, drawn from the same
/// rotation. `None` when the pool is empty.
pub fn trailing_ad(
    cycler: &mut AdCycler,
    ad_segments: &HashMap<String, Vec<Segment>>,
) -> ScheduleResult<Option<(String, Vec<TimelineEntry>)>> {
    let Some(ad) = cycler.select_next().cloned() else {
        return Ok(None);
    };
    let entries = ad_segments
        .get(&ad.id)
        .filter(|segments| !segments.is_empty())
        .map(|segments| entries_for(segments, OriginKind::Ad))
        .ok_or_else(|| ScheduleError::MissingAdSegments {
            asset_id: ad.id.clone(),
        })?;
    Ok(Some((ad.id.clone(), entries)))
}

fn resolve_total(asset: &MediaAsset, segments: &[Segment]) -> ScheduleResult<f64> {
    let sum: f64 = segments.iter().map(|segment| segment.duration).sum();
    if let Some(declared) = asset.total_duration {
        if (declared - sum).abs() > DURATION_TOLERANCE_SEC {
            warn!(
                asset_id = %asset.id,
                declared,
                probed = sum,
                "declared duration differs from probed segments"
            );
            return Err(ScheduleError::InconsistentDurations {
                asset_id: asset.id.clone(),
                expected: declared,
                actual: sum,
            });
        }
    }
    Ok(sum)
}

fn entries_for(segments: &[Segment], origin_kind: OriginKind) -> Vec<TimelineEntry> {
    segments
        .iter()
        .map(|segment| TimelineEntry {
            origin_id: segment.asset_id.clone(),
            origin_kind,
            segment: segment.clone(),
        })
        .collect()
}

fn deferred(
    entries: Vec<TimelineEntry>,
    ad_entries: Vec<TimelineEntry>,
    show_id: &str,
    ad_id: &str,
    reason: &str,
) -> (Vec<TimelineEntry>, AdPlacement) {
    debug!(asset_id = %show_id, ad_id = %ad_id, reason, "ad deferred to end of show");
    let mut ordered = entries;
    ordered.extend(ad_entries);
    (
        ordered,
        AdPlacement::EndOfShow {
            ad_id: ad_id.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetKind;
    use crate::schedule::cue::plan_segments;

    fn policy() -> SchedulePolicy {
        SchedulePolicy {
            nominal_segment_sec: 420.0,
            split_threshold_sec: 420.0,
            min_last_segment_sec: 240.0,
            defer_remainder_sec: 780.0,
        }
    }

    fn segments_for(id: &str, total: f64, nominal: f64) -> Vec<Segment> {
        plan_segments(total, nominal)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(index, duration)| Segment {
                asset_id: id.to_string(),
                index,
                filename: format!("seg{index:03}.ts"),
                duration,
            })
            .collect()
    }

    fn show(id: &str) -> MediaAsset {
        MediaAsset::new(id, format!("{id}.mp4"), AssetKind::Show)
    }

    fn ad_pool(ids: &[&str], total: f64) -> (AdCycler, HashMap<String, Vec<Segment>>) {
        let pool = ids
            .iter()
            .map(|id| MediaAsset::new(*id, format!("{id}.mp4"), AssetKind::Ad))
            .collect();
        let segments = ids
            .iter()
            .map(|id| (id.to_string(), segments_for(id, total, 420.0)))
            .collect();
        (AdCycler::new(pool), segments)
    }

    #[test]
    fn long_show_gets_mid_show_break() {
        // 1600s show: first cue at 420s leaves 1180s > 780s of show.
        let (mut cycler, ads) = ad_pool(&["ad1"], 30.0);
        let timeline = build_show_timeline(
            &show("show-a"),
            &segments_for("show-a", 1600.0, 420.0),
            &mut cycler,
            &ads,
            &policy(),
        )
        .unwrap();

        assert_eq!(
            timeline.placement,
            Some(AdPlacement::MidShow {
                ad_id: "ad1".into(),
                cue_index: 0
            })
        );
        let origins: Vec<&str> = timeline
            .entries
            .iter()
            .map(|entry| entry.origin_id.as_str())
            .collect();
        assert_eq!(origins, ["show-a", "ad1", "show-a", "show-a", "show-a"]);
        // Show segments keep ordinal order around the break.
        let show_indices: Vec<usize> = timeline
            .entries
            .iter()
            .filter(|entry| entry.origin_kind == OriginKind::Show)
            .map(|entry| entry.segment.index)
            .collect();
        assert_eq!(show_indices, [0, 1, 2, 3]);
    }

    #[test]
    fn short_show_defers_ad_to_end() {
        // 500s show: no boundary leaves more than 240s, so no legal cue.
        let (mut cycler, ads) = ad_pool(&["ad1"], 30.0);
        let timeline = build_show_timeline(
            &show("show-b"),
            &segments_for("show-b", 500.0, 420.0),
            &mut cycler,
            &ads,
            &policy(),
        )
        .unwrap();

        assert_eq!(
            timeline.placement,
            Some(AdPlacement::EndOfShow { ad_id: "ad1".into() })
        );
        assert_eq!(timeline.entries.last().unwrap().origin_id, "ad1");
    }

    #[test]
    fn short_remainder_after_cue_defers() {
        // 1500s show: cue at 420s leaves 1080s > 780 -> would insert; shrink
        // the remainder threshold check with a 1150s show instead: cue at
        // 420s leaves 730s <= 780 -> defer even though the cue is legal.
        let (mut cycler, ads) = ad_pool(&["ad1"], 30.0);
        let timeline = build_show_timeline(
            &show("show-c"),
            &segments_for("show-c", 1150.0, 420.0),
            &mut cycler,
            &ads,
            &policy(),
        )
        .unwrap();
        assert_eq!(
            timeline.placement,
            Some(AdPlacement::EndOfShow { ad_id: "ad1".into() })
        );
    }

    #[test]
    fn empty_pool_leaves_show_unchanged() {
        let (mut cycler, ads) = ad_pool(&[], 30.0);
        let segments = segments_for("show-a", 1600.0, 420.0);
        let timeline =
            build_show_timeline(&show("show-a"), &segments, &mut cycler, &ads, &policy()).unwrap();
        assert_eq!(timeline.placement, None);
        assert_eq!(timeline.entries.len(), segments.len());
        assert!(trailing_ad(&mut cycler, &ads).unwrap().is_none());
    }

    #[test]
    fn rotation_continues_across_shows_and_trailer() {
        let (mut cycler, ads) = ad_pool(&["ad1", "ad2"], 30.0);
        for label in ["show-a", "show-b", "show-c"] {
            build_show_timeline(
                &show(label),
                &segments_for(label, 1600.0, 420.0),
                &mut cycler,
                &ads,
                &policy(),
            )
            .unwrap();
        }
        let (trailer_id, entries) = trailing_ad(&mut cycler, &ads).unwrap().unwrap();
        // Selections ad1, ad2, ad1 went to the shows; the trailer is ad2.
        assert_eq!(trailer_id, "ad2");
        assert!(!entries.is_empty());
        assert_eq!(cycler.selections(), 4);
    }

    #[test]
    fn zero_segments_is_a_schedule_error() {
        let (mut cycler, ads) = ad_pool(&["ad1"], 30.0);
        let err =
            build_show_timeline(&show("show-a"), &[], &mut cycler, &ads, &policy()).unwrap_err();
        assert!(matches!(err, ScheduleError::EmptySegments { .. }));
    }

    #[test]
    fn declared_duration_mismatch_is_rejected() {
        let (mut cycler, ads) = ad_pool(&["ad1"], 30.0);
        let mut asset = show("show-a");
        asset.total_duration = Some(900.0);
        let err = build_show_timeline(
            &asset,
            &segments_for("show-a", 1600.0, 420.0),
            &mut cycler,
            &ads,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::InconsistentDurations { .. }));
    }
}
