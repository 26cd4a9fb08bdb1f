//! Unit selection
//!
//! Which units a task filter picks is a swappable strategy: the driver
//! only sees a range, so substring matching can be replaced by structured
//! markers or an explicit manifest without touching the commit and
//! fault-isolation policy.

use std::ops::Range;

use crate::unit::Unit;

/// Strategy for locating the units a task filter refers to
pub trait UnitSelector {
    /// The half-open index range of task-specific units, or `None` when
    /// the filter matches nothing
    fn select(&self, units: &[Unit]) -> Option<Range<usize>>;
}

/// Case-insensitive substring matching against unit source text
///
/// The selected range starts at the first unit containing the marker and
/// ends at the first later unit containing the bounding marker (end of
/// sequence if unbounded or never found).
#[derive(Debug, Clone)]
pub struct MarkerSelector {
    marker: String,
    next_marker: Option<String>,
}

impl MarkerSelector {
    /// Select units containing `marker`
    pub fn new<S: Into<String>>(marker: S) -> Self {
        Self {
            marker: marker.into().to_lowercase(),
            next_marker: None,
        }
    }

    /// Stop the selection at the first unit containing `next_marker`
    pub fn bounded_by<S: Into<String>>(mut self, next_marker: S) -> Self {
        self.next_marker = Some(next_marker.into().to_lowercase());
        self
    }
}

impl UnitSelector for MarkerSelector {
    fn select(&self, units: &[Unit]) -> Option<Range<usize>> {
        let contains = |unit: &Unit, marker: &str| unit.source().to_lowercase().contains(marker);

        let start = units.iter().position(|u| contains(u, &self.marker))?;
        let end = self
            .next_marker
            .as_deref()
            .and_then(|next| {
                units[start + 1..]
                    .iter()
                    .position(|u| contains(u, next))
                    .map(|offset| start + 1 + offset)
            })
            .unwrap_or(units.len());

        Some(start..end)
    }
}
