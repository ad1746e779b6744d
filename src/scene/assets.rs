use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::HostResult;
use crate::host::{LoadedAsset, PrefabId};

#[derive(Debug)]
enum Slot<W> {
    Loading(Vec<W>),
    Ready(PrefabId),
}

/// Outcome of asking the cache for an asset.
#[derive(Debug, PartialEq, Eq)]
pub enum AssetRequest<W> {
    /// Already loaded; the waiter is handed straight back.
    Ready(PrefabId, W),
    /// A load is already in flight; the waiter will get its result.
    Queued,
    /// Nothing was in flight. The caller must start the load.
    Started,
}

/// Loaded assets by path, plus the loads still in flight and whoever is
/// waiting on them. At most one load per path is ever in flight.
#[derive(Debug)]
pub struct AssetCache<W> {
    slots: HashMap<PathBuf, Slot<W>>,
}

impl<W> Default for AssetCache<W> {
    fn default() -> Self {
        AssetCache {
            slots: HashMap::new(),
        }
    }
}

impl<W> AssetCache<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, path: &Path, waiter: W) -> AssetRequest<W> {
        match self.slots.get_mut(path) {
            Some(Slot::Ready(prefab)) => AssetRequest::Ready(*prefab, waiter),
            Some(Slot::Loading(waiters)) => {
                waiters.push(waiter);
                AssetRequest::Queued
            }
            None => {
                self.slots
                    .insert(path.to_owned(), Slot::Loading(vec![waiter]));
                AssetRequest::Started
            }
        }
    }

    /// Records the outcome of a load and hands back everyone who was waiting
    /// on it. A failed load is forgotten, so a later request starts afresh.
    pub fn complete(
        &mut self,
        path: &Path,
        result: HostResult<LoadedAsset>,
    ) -> (HostResult<PrefabId>, Vec<W>) {
        let outcome = result.and_then(|asset| asset.first_unit(path));

        let waiters = match self.slots.remove(path) {
            Some(Slot::Loading(waiters)) => waiters,
            Some(Slot::Ready(prefab)) => {
                // Nobody asked for this load; keep what we had
                tracing::warn!(path = %path.display(), "unexpected reload of a cached asset");
                self.slots.insert(path.to_owned(), Slot::Ready(prefab));
                return (outcome, vec![]);
            }
            None => {
                tracing::warn!(path = %path.display(), "load finished that was never requested");
                vec![]
            }
        };

        if let Ok(prefab) = &outcome {
            self.slots.insert(path.to_owned(), Slot::Ready(*prefab));
        }
        (outcome, waiters)
    }

    /// Abandons an in-flight load, returning its waiters.
    pub fn abandon(&mut self, path: &Path) -> Vec<W> {
        match self.slots.remove(path) {
            Some(Slot::Loading(waiters)) => waiters,
            Some(ready @ Slot::Ready(_)) => {
                self.slots.insert(path.to_owned(), ready);
                vec![]
            }
            None => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;

    fn loaded(prefab: usize) -> HostResult<LoadedAsset> {
        Ok(LoadedAsset {
            units: vec![None, Some(PrefabId(prefab))],
        })
    }

    #[test]
    fn test_concurrent_requests_share_one_load() {
        let mut cache = AssetCache::new();
        let path = Path::new("earth.obj");

        assert_eq!(cache.request(path, "earth"), AssetRequest::Started);
        assert_eq!(cache.request(path, "moon"), AssetRequest::Queued);

        let (outcome, waiters) = cache.complete(path, loaded(3));
        assert_eq!(outcome, Ok(PrefabId(3)));
        assert_eq!(waiters, vec!["earth", "moon"]);

        assert_eq!(
            cache.request(path, "late"),
            AssetRequest::Ready(PrefabId(3), "late")
        );
    }

    #[test]
    fn test_failed_load_is_forgotten() {
        let mut cache = AssetCache::new();
        let path = Path::new("pluto.obj");
        cache.request(path, 1);

        let failure = Err(HostError::Load {
            path: path.to_owned(),
            reason: String::from("nope"),
        });
        let (outcome, waiters) = cache.complete(path, failure);
        assert!(outcome.is_err());
        assert_eq!(waiters, vec![1]);
        assert_eq!(cache.request(path, 2), AssetRequest::Started);
    }

    #[test]
    fn test_asset_without_units() {
        let mut cache = AssetCache::new();
        let path = Path::new("empty.obj");
        cache.request(path, ());

        let (outcome, _) = cache.complete(path, Ok(LoadedAsset { units: vec![None] }));
        assert_eq!(outcome, Err(HostError::NoLoadableUnit(path.to_owned())));
        assert_eq!(cache.request(path, ()), AssetRequest::Started);
    }

    #[test]
    fn test_abandon() {
        let mut cache = AssetCache::new();
        let path = Path::new("ring.obj");
        cache.request(path, 'a');
        cache.request(path, 'b');
        assert_eq!(cache.abandon(path), vec!['a', 'b']);
        assert_eq!(cache.request(path, 'c'), AssetRequest::Started);
    }
}
