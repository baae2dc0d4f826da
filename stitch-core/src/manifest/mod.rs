pub mod error;
pub mod writer;

pub use error::{ManifestError, ManifestResult};
pub use writer::{default_master_name, ManifestWriter, STREAM_INF_BANDWIDTH};

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::asset::Segment;
use crate::schedule::TimelineEntry;

/// Declared target duration for a playlist with no entries.
pub const DEFAULT_TARGET_DURATION: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub filename: String,
    pub duration: f64,
}

/// A static VOD media playlist. `media_sequence` is always 0; there is no
/// rolling window.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub target_duration: u32,
    pub media_sequence: u32,
    pub entries: Vec<PlaylistEntry>,
    pub discontinuity_before: BTreeSet<usize>,
}

impl Playlist {
    /// Per-asset playlist: unprefixed filenames, no discontinuities.
    pub fn from_segments(segments: &[Segment]) -> Self {
        let entries = segments
            .iter()
            .map(|segment| PlaylistEntry {
                filename: segment.filename.clone(),
                duration: segment.duration,
            })
            .collect();
        Self::assemble(entries, BTreeSet::new())
    }

    /// Flattened cross-asset playlist. Filenames are prefixed with the
    /// owning asset id so identically numbered chunks cannot collide, and a
    /// discontinuity is marked wherever the origin asset changes (never
    /// before the first entry).
    pub fn from_timeline(timeline: &[TimelineEntry]) -> Self {
        let entries = timeline
            .iter()
            .map(|entry| PlaylistEntry {
                filename: format!("{}/{}", entry.origin_id, entry.segment.filename),
                duration: entry.segment.duration,
            })
            .collect();
        let discontinuities = timeline
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0].origin_id != pair[1].origin_id)
            .map(|(index, _)| index + 1)
            .collect();
        Self::assemble(entries, discontinuities)
    }

    fn assemble(entries: Vec<PlaylistEntry>, discontinuity_before: BTreeSet<usize>) -> Self {
        let target_duration = entries
            .iter()
            .map(|entry| entry.duration.ceil() as u32)
            .max()
            .unwrap_or(DEFAULT_TARGET_DURATION);
        Self {
            target_duration,
            media_sequence: 0,
            entries,
            discontinuity_before,
        }
    }

    /// Render the manifest text. The layout is consumed byte-for-byte by
    /// downstream players; durations carry exactly three decimals.
    pub fn render(&self) -> String {
        let mut out = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
        let _ = writeln!(out, "#EXT-X-TARGETDURATION:{}", self.target_duration);
        let _ = writeln!(out, "#EXT-X-MEDIA-SEQUENCE:{}", self.media_sequence);
        for (index, entry) in self.entries.iter().enumerate() {
            if self.discontinuity_before.contains(&index) {
                out.push_str("#EXT-X-DISCONTINUITY\n");
            }
            let _ = writeln!(out, "#EXTINF:{:.3},", entry.duration);
            let _ = writeln!(out, "{}", entry.filename);
        }
        out.push_str("#EXT-X-ENDLIST\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::OriginKind;

    fn segment(asset_id: &str, index: usize, duration: f64) -> Segment {
        Segment {
            asset_id: asset_id.to_string(),
            index,
            filename: format!("seg{index:03}.ts"),
            duration,
        }
    }

    fn entry(asset_id: &str, index: usize, duration: f64, kind: OriginKind) -> TimelineEntry {
        TimelineEntry {
            segment: segment(asset_id, index, duration),
            origin_id: asset_id.to_string(),
            origin_kind: kind,
        }
    }

    #[test]
    fn target_duration_is_ceiling_of_max() {
        let playlist =
            Playlist::from_segments(&[segment("a", 0, 6.0), segment("a", 1, 6.672)]);
        assert_eq!(playlist.target_duration, 7);
        assert_eq!(playlist.media_sequence, 0);
    }

    #[test]
    fn empty_playlist_uses_default_target() {
        let playlist = Playlist::from_segments(&[]);
        assert_eq!(playlist.target_duration, DEFAULT_TARGET_DURATION);
    }

    #[test]
    fn per_asset_render_is_byte_exact() {
        let playlist =
            Playlist::from_segments(&[segment("a", 0, 6.0), segment("a", 1, 4.238)]);
        assert_eq!(
            playlist.render(),
            "#EXTM3U\n\
             #EXT-X-VERSION:3\n\
             #EXT-X-TARGETDURATION:6\n\
             #EXT-X-MEDIA-SEQUENCE:0\n\
             #EXTINF:6.000,\n\
             seg000.ts\n\
             #EXTINF:4.238,\n\
             seg001.ts\n\
             #EXT-X-ENDLIST\n"
        );
    }

    #[test]
    fn discontinuities_only_at_origin_changes() {
        let timeline = [
            entry("show", 0, 6.0, OriginKind::Show),
            entry("show", 1, 6.0, OriginKind::Show),
            entry("ad", 0, 5.0, OriginKind::Ad),
            entry("show", 2, 6.0, OriginKind::Show),
        ];
        let playlist = Playlist::from_timeline(&timeline);
        assert_eq!(
            playlist.discontinuity_before,
            BTreeSet::from([2usize, 3usize])
        );
        assert_eq!(playlist.entries[2].filename, "ad/seg000.ts");

        let rendered = playlist.render();
        assert_eq!(rendered.matches("#EXT-X-DISCONTINUITY").count(), 2);
        assert!(!rendered.starts_with("#EXT-X-DISCONTINUITY"));
        assert!(rendered.contains("#EXT-X-DISCONTINUITY\n#EXTINF:5.000,\nad/seg000.ts\n"));
    }

    #[test]
    fn single_origin_timeline_has_no_discontinuities() {
        let timeline = [
            entry("show", 0, 6.0, OriginKind::Show),
            entry("show", 1, 6.0, OriginKind::Show),
        ];
        let playlist = Playlist::from_timeline(&timeline);
        assert!(playlist.discontinuity_before.is_empty());
    }
}
