use crate::annotations::TagAssignments;
use crate::collection::MessageEntry;
use crate::selection::FacetSelection;
use crate::timestamp::{sort_chronologically, TimestampParser};

pub const DAY_MS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimePreset {
    #[default]
    All,
    Last24Hours,
    Last30Days,
    Custom {
        from: Option<i64>,
        to: Option<i64>,
    },
}

impl TimePreset {
    /// Builds a custom range from date-time input text (`YYYY-MM-DDTHH:MM` and
    /// the other recognized timestamp shapes). Blank or unreadable text leaves
    /// that side open.
    pub fn custom_from_text(from: &str, to: &str, parser: &TimestampParser) -> Self {
        TimePreset::Custom {
            from: parser.parse(from),
            to: parser.parse(to),
        }
    }

    pub fn bounds(&self, now_ms: i64) -> TimeBounds {
        match *self {
            TimePreset::All => TimeBounds::default(),
            TimePreset::Last24Hours => TimeBounds {
                start: Some(now_ms - DAY_MS),
                end: Some(now_ms),
            },
            TimePreset::Last30Days => TimeBounds {
                start: Some(now_ms - 30 * DAY_MS),
                end: Some(now_ms),
            },
            TimePreset::Custom { from, to } => TimeBounds { start: from, end: to },
        }
    }
}

/// Closed interval in epoch milliseconds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeBounds {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl TimeBounds {
    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// An unknown instant never satisfies an active bound.
    pub fn contains(&self, instant: Option<i64>) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(ts) = instant else {
            return false;
        };
        if matches!(self.start, Some(start) if ts < start) {
            return false;
        }
        if matches!(self.end, Some(end) if ts > end) {
            return false;
        }
        true
    }
}

pub struct FilterCriteria<'a> {
    pub chat: &'a dyn FacetSelection,
    pub sender: &'a dyn FacetSelection,
    pub media: &'a dyn FacetSelection,
    pub tags: &'a dyn FacetSelection,
    pub search: &'a str,
    pub time: TimeBounds,
}

/// Runs every facet over the whole collection and returns the survivors in
/// chronological order.
///
/// Facets combine with AND; values inside one multi-select facet combine with
/// OR. An empty facet selection does not filter.
pub fn apply<'m>(
    entries: &'m [MessageEntry],
    criteria: &FilterCriteria<'_>,
    assignments: &TagAssignments,
) -> Vec<&'m MessageEntry> {
    matching_positions(entries, criteria, assignments)
        .into_iter()
        .map(|idx| &entries[idx])
        .collect()
}

/// Same as [`apply`], returning positions into `entries`.
pub fn matching_positions(
    entries: &[MessageEntry],
    criteria: &FilterCriteria<'_>,
    assignments: &TagAssignments,
) -> Vec<usize> {
    let needle = criteria.search.to_lowercase();
    let mut kept: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| matches(entry, criteria, &needle, assignments))
        .map(|(idx, _)| idx)
        .collect();
    sort_chronologically(&mut kept, |idx| entries[*idx].instant);
    tracing::debug!(kept = kept.len(), total = entries.len(), "filters applied");
    kept
}

fn matches(entry: &MessageEntry, criteria: &FilterCriteria<'_>, needle: &str, assignments: &TagAssignments) -> bool {
    criteria.chat.accepts(&entry.message.chat)
        && criteria.sender.accepts(&entry.message.sender)
        && matches_media(entry, criteria.media)
        && matches_tags(entry, criteria.tags, assignments)
        && criteria.time.contains(entry.instant)
        && (needle.is_empty() || matches_search(entry, needle, assignments))
}

fn matches_media(entry: &MessageEntry, media: &dyn FacetSelection) -> bool {
    if !media.is_active() {
        return true;
    }
    entry
        .media_kind
        .map(|kind| media.selected().contains(kind.as_str()))
        .unwrap_or(false)
}

fn matches_tags(entry: &MessageEntry, tags: &dyn FacetSelection, assignments: &TagAssignments) -> bool {
    if !tags.is_active() {
        return true;
    }
    assignments
        .get(&entry.key)
        .map(|assigned| assigned.iter().any(|tag| tags.selected().contains(tag.name())))
        .unwrap_or(false)
}

fn matches_search(entry: &MessageEntry, needle: &str, assignments: &TagAssignments) -> bool {
    if entry.message.content.to_lowercase().contains(needle)
        || entry.message.sender.to_lowercase().contains(needle)
    {
        return true;
    }
    assignments
        .get(&entry.key)
        .map(|assigned| assigned.iter().any(|tag| tag.name().to_lowercase().contains(needle)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_resolve_against_now() {
        let now = 100 * DAY_MS;
        assert_eq!(TimePreset::All.bounds(now), TimeBounds::default());
        assert_eq!(
            TimePreset::Last24Hours.bounds(now),
            TimeBounds { start: Some(99 * DAY_MS), end: Some(now) }
        );
        assert_eq!(TimePreset::Last30Days.bounds(now).start, Some(70 * DAY_MS));
    }

    #[test]
    fn bounds_are_closed_and_reject_unknown() {
        let bounds = TimeBounds { start: Some(10), end: Some(20) };
        assert!(bounds.contains(Some(10)));
        assert!(bounds.contains(Some(20)));
        assert!(!bounds.contains(Some(21)));
        assert!(!bounds.contains(None));

        let open_end = TimeBounds { start: Some(10), end: None };
        assert!(open_end.contains(Some(i64::MAX)));
        assert!(!open_end.contains(None));
        assert!(TimeBounds::default().contains(None));
    }

    #[test]
    fn custom_range_reads_datetime_input() {
        let parser = TimestampParser::default();
        let preset = TimePreset::custom_from_text("2024-03-01T08:30", "", &parser);
        assert_eq!(
            preset,
            TimePreset::Custom { from: Some(1_709_281_800_000), to: None }
        );
    }
}
