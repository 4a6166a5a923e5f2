//! Cutoff times and the visibility rules they imply.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Entity, Key};

/// The latest time at which data may be used for a target row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffTime {
    /// One cutoff for every target row.
    Global(NaiveDateTime),
    /// A cutoff per target index key; unlisted rows have no cutoff.
    PerRow(BTreeMap<Key, NaiveDateTime>),
}

impl CutoffTime {
    pub fn per_row<K: Into<Key>>(entries: impl IntoIterator<Item = (K, NaiveDateTime)>) -> Self {
        CutoffTime::PerRow(entries.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }
}

/// Target rows sharing one cutoff.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Partition {
    pub cutoff: Option<NaiveDateTime>,
    pub rows: Vec<usize>,
}

/// Group the target's rows by cutoff, ordered by cutoff (no cutoff first).
pub(crate) fn partition(target: &Entity, cutoff: Option<&CutoffTime>) -> Vec<Partition> {
    let all_rows = || (0..target.num_rows()).collect::<Vec<_>>();

    match cutoff {
        None => vec![Partition {
            cutoff: None,
            rows: all_rows(),
        }],
        Some(CutoffTime::Global(ts)) => vec![Partition {
            cutoff: Some(*ts),
            rows: all_rows(),
        }],
        Some(CutoffTime::PerRow(map)) => {
            for key in map.keys() {
                if target.row_of(key).is_none() {
                    warn!(
                        entity = %target.name(),
                        key = %key,
                        "cutoff given for unknown instance; ignoring"
                    );
                }
            }

            let mut groups: BTreeMap<Option<NaiveDateTime>, Vec<usize>> = BTreeMap::new();
            for (row, key) in target.index_keys().into_iter().enumerate() {
                groups.entry(map.get(&key).copied()).or_default().push(row);
            }
            groups
                .into_iter()
                .map(|(cutoff, rows)| Partition { cutoff, rows })
                .collect()
        }
    }
}

/// Time bounds applied to rows of entities with a time index.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Window {
    pub cutoff: Option<NaiveDateTime>,
    pub training_window: Option<Duration>,
}

impl Window {
    /// Whether a row stamped `time` may be used.
    ///
    /// Without a cutoff everything is visible, window included.
    pub fn admits(&self, time: NaiveDateTime) -> bool {
        let Some(cutoff) = self.cutoff else {
            return true;
        };
        if time > cutoff {
            return false;
        }
        match self.training_window {
            Some(window) => time > cutoff - window,
            None => true,
        }
    }
}
