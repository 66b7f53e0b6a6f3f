//! In-memory head block
//!
//! # Design
//!
//! - Series keyed by [`SeriesRef`] in an `FxHashMap`
//! - Exact label set → ref lookup for appends
//! - Postings: label name → value → refs, for equality matchers
//! - Samples kept sorted by timestamp; equal timestamps keep append order

use rustc_hash::FxHashMap;
use spanstore_core::{Labels, MatchType, Matcher};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::tsdb::{Sample, Series, SeriesRef};

#[derive(Debug)]
struct MemSeries {
    labels: Labels,
    samples: Vec<Sample>,
}

impl MemSeries {
    fn insert(&mut self, timestamp: i64, payload: Arc<[u8]>) {
        let idx = self.samples.partition_point(|s| s.timestamp <= timestamp);
        self.samples.insert(idx, Sample { timestamp, payload });
    }

    fn in_range(&self, mint: i64, maxt: i64) -> &[Sample] {
        let lo = self.samples.partition_point(|s| s.timestamp < mint);
        let hi = self.samples.partition_point(|s| s.timestamp <= maxt);
        if lo >= hi {
            &[]
        } else {
            &self.samples[lo..hi]
        }
    }
}

/// Index and sample storage
#[derive(Debug, Default)]
pub struct Head {
    series: FxHashMap<SeriesRef, MemSeries>,
    by_labels: FxHashMap<Labels, SeriesRef>,
    postings: FxHashMap<String, BTreeMap<String, BTreeSet<SeriesRef>>>,
    next_ref: u64,
    min_time: Option<i64>,
    max_time: Option<i64>,
}

impl Head {
    /// Empty head
    pub fn new() -> Self {
        Self::default()
    }

    /// Ref of the series with exactly these labels
    pub fn lookup(&self, labels: &Labels) -> Option<SeriesRef> {
        self.by_labels.get(labels).copied()
    }

    /// Ref of the series with these labels, creating an empty one if needed
    pub fn get_or_create(&mut self, labels: &Labels) -> SeriesRef {
        if let Some(r) = self.lookup(labels) {
            return r;
        }
        let r = SeriesRef(self.next_ref);
        self.next_ref += 1;
        for label in labels {
            self.postings
                .entry(label.name.clone())
                .or_default()
                .entry(label.value.clone())
                .or_default()
                .insert(r);
        }
        self.by_labels.insert(labels.clone(), r);
        self.series.insert(
            r,
            MemSeries {
                labels: labels.clone(),
                samples: Vec::new(),
            },
        );
        r
    }

    /// Drop a series that never received a sample
    ///
    /// Returns whether it was removed.
    pub fn remove_if_empty(&mut self, r: SeriesRef) -> bool {
        match self.series.get(&r) {
            Some(series) if series.samples.is_empty() => {
                self.remove_series(r);
                true
            }
            _ => false,
        }
    }

    /// Append a sample to a series
    pub fn append(&mut self, labels: &Labels, timestamp: i64, payload: Arc<[u8]>) {
        let r = self.get_or_create(labels);
        if let Some(series) = self.series.get_mut(&r) {
            series.insert(timestamp, payload);
        }
        self.min_time = Some(self.min_time.map_or(timestamp, |m| m.min(timestamp)));
        self.max_time = Some(self.max_time.map_or(timestamp, |m| m.max(timestamp)));
    }

    /// Newest sample timestamp
    pub fn max_time(&self) -> Option<i64> {
        self.max_time
    }

    /// Oldest sample timestamp
    pub fn min_time(&self) -> Option<i64> {
        self.min_time
    }

    /// Number of series, empty ones included
    pub fn num_series(&self) -> usize {
        self.series.len()
    }

    /// Number of samples
    pub fn num_samples(&self) -> usize {
        self.series.values().map(|s| s.samples.len()).sum()
    }

    /// Series matching every matcher with samples in `[mint, maxt]`,
    /// ordered by label set
    pub fn select(&self, matchers: &[Matcher], mint: i64, maxt: i64) -> Vec<Series> {
        let mut out: Vec<Series> = self
            .candidates(matchers)
            .into_iter()
            .filter_map(|r| self.series.get(&r))
            .filter(|s| s.labels.matches_all(matchers))
            .filter_map(|s| {
                let samples = s.in_range(mint, maxt);
                if samples.is_empty() {
                    None
                } else {
                    Some(Series {
                        labels: s.labels.clone(),
                        samples: samples.to_vec(),
                    })
                }
            })
            .collect();
        out.sort_by(|a, b| a.labels.cmp(&b.labels));
        out
    }

    /// Distinct non-empty values of `name` on series with samples in range
    pub fn label_values(&self, name: &str, mint: i64, maxt: i64) -> Vec<String> {
        let Some(values) = self.postings.get(name) else {
            return Vec::new();
        };
        values
            .iter()
            .filter(|(value, _)| !value.is_empty())
            .filter(|(_, refs)| {
                refs.iter().any(|r| {
                    self.series
                        .get(r)
                        .map_or(false, |s| !s.in_range(mint, maxt).is_empty())
                })
            })
            .map(|(value, _)| value.clone())
            .collect()
    }

    /// Drop samples older than `cutoff` and series left empty
    ///
    /// Returns the number of samples removed.
    pub fn truncate_before(&mut self, cutoff: i64) -> usize {
        let mut removed = 0;
        let mut emptied = Vec::new();
        for (r, series) in self.series.iter_mut() {
            let keep_from = series.samples.partition_point(|s| s.timestamp < cutoff);
            if keep_from > 0 {
                series.samples.drain(..keep_from);
                removed += keep_from;
            }
            if series.samples.is_empty() {
                emptied.push(*r);
            }
        }
        for r in emptied {
            self.remove_series(r);
        }
        self.min_time = self
            .series
            .values()
            .filter_map(|s| s.samples.first().map(|x| x.timestamp))
            .min();
        if self.min_time.is_none() {
            self.max_time = None;
        }
        removed
    }

    fn remove_series(&mut self, r: SeriesRef) {
        let Some(series) = self.series.remove(&r) else {
            return;
        };
        self.by_labels.remove(&series.labels);
        for label in &series.labels {
            if let Some(values) = self.postings.get_mut(&label.name) {
                if let Some(refs) = values.get_mut(&label.value) {
                    refs.remove(&r);
                    if refs.is_empty() {
                        values.remove(&label.value);
                    }
                }
                if values.is_empty() {
                    self.postings.remove(&label.name);
                }
            }
        }
    }

    /// Smallest posting list implied by the non-empty equality matchers,
    /// or every series when there is none
    fn candidates(&self, matchers: &[Matcher]) -> Vec<SeriesRef> {
        let mut best: Option<&BTreeSet<SeriesRef>> = None;
        for m in matchers {
            if m.match_type != MatchType::Equal || m.value.is_empty() {
                continue;
            }
            match self.postings.get(&m.name).and_then(|v| v.get(&m.value)) {
                Some(refs) => {
                    if best.map_or(true, |b| refs.len() < b.len()) {
                        best = Some(refs);
                    }
                }
                None => return Vec::new(),
            }
        }
        match best {
            Some(refs) => refs.iter().copied().collect(),
            None => self.series.keys().copied().collect(),
        }
    }
}
