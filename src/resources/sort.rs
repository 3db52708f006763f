use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::seq::SliceRandom;
use tracing::warn;

use crate::catalog::CatalogQuery;

use super::{GroupSet, ResourceCatalog};

/// Load samples at least this old are ignored by the load-based sort.
pub const LOAD_SAMPLE_MAX_AGE_SECS: i64 = 1800;

/// Load factors at or above this mark a saturated resource; such samples
/// never win the load sort.
pub const LOAD_FACTOR_CEILING: i32 = 100;

/// Candidate ordering schemes for [`ResourceCatalog::sort_candidates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortScheme {
    /// Uniform random permutation.
    Random,
    /// Cache-class candidates first, archive-class second, the rest
    /// unchanged.
    ByClass,
    /// Move the single least-loaded candidate to the head; the rest keep
    /// their order.
    ByLoad,
    /// Candidates local to this host first, secondarily by class.
    ByLocation,
}

impl FromStr for SortScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(SortScheme::Random),
            "by_class" => Ok(SortScheme::ByClass),
            "by_load" => Ok(SortScheme::ByLoad),
            "by_location" => Ok(SortScheme::ByLocation),
            _ => Err(format!("unknown sort scheme: {}", s)),
        }
    }
}

impl fmt::Display for SortScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortScheme::Random => write!(f, "random"),
            SortScheme::ByClass => write!(f, "by_class"),
            SortScheme::ByLoad => write!(f, "by_load"),
            SortScheme::ByLocation => write!(f, "by_location"),
        }
    }
}

impl ResourceCatalog {
    /// Reorder `candidates` in place under `scheme`.
    ///
    /// Sorting never fails: if the load side table is unavailable the
    /// candidates keep their current order and a warning is logged.
    pub fn sort_candidates(
        &self,
        catalog: &dyn CatalogQuery,
        candidates: &mut GroupSet,
        scheme: SortScheme,
    ) {
        match scheme {
            SortScheme::Random => {
                let mut order: Vec<usize> = (0..candidates.len()).collect();
                order.shuffle(&mut rand::thread_rng());
                candidates.apply_permutation(&order);
            }
            SortScheme::ByClass => {
                candidates.sort_by_key(|e| e.resource.class.sort_rank());
            }
            SortScheme::ByLocation => {
                let host = self.local_host().to_string();
                candidates.sort_by_key(|e| {
                    let remote = u8::from(!e.resource.is_local_to(&host));
                    (remote, e.resource.class.sort_rank())
                });
            }
            SortScheme::ByLoad => self.sort_by_load(catalog, candidates),
        }
    }

    fn sort_by_load(&self, catalog: &dyn CatalogQuery, candidates: &mut GroupSet) {
        let samples = match catalog.load_samples() {
            Ok(samples) => samples,
            Err(err) => {
                warn!(error = %err, "load samples unavailable; keeping candidate order");
                return;
            }
        };
        let now = Utc::now();
        let mut best: Option<(usize, i32)> = None;
        for (index, entry) in candidates.iter().enumerate() {
            let sample = samples
                .iter()
                .find(|s| s.resource_name == entry.resource.name);
            let Some(sample) = sample else { continue };
            if sample.load_factor < 0 || sample.load_factor >= LOAD_FACTOR_CEILING {
                continue;
            }
            let age = now.signed_duration_since(sample.sampled_at).num_seconds();
            if age >= LOAD_SAMPLE_MAX_AGE_SECS {
                continue;
            }
            if best.map_or(true, |(_, load)| sample.load_factor < load) {
                best = Some((index, sample.load_factor));
            }
        }
        if let Some((index, _)) = best {
            if index != 0 {
                candidates.promote(index);
            }
        }
    }
}
