use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::warn;

use super::{TrackId, TrackRef, TrackStore};

pub const META_URI: &str = ":URI";
pub const META_TITLE: &str = "title";
pub const META_ALBUM: &str = "album";

/// In-memory track store with per-track reference counts.
///
/// Metadata sits behind a read/write lock that is held only for the length
/// of a single lookup. Reference counts are tracked separately so tests can
/// check that every acquire was paired with exactly one release.
#[derive(Debug, Default)]
pub struct MemoryPlaylist {
    tracks: RwLock<HashMap<TrackId, HashMap<String, String>>>,
    refs: Mutex<HashMap<TrackId, usize>>,
    next_id: AtomicU64,
    acquired: AtomicU64,
    released: AtomicU64,
}

impl MemoryPlaylist {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert<K, V>(&self, meta: impl IntoIterator<Item = (K, V)>) -> TrackId
    where
        K: Into<String>,
        V: Into<String>,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let fields = meta
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.tracks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, fields);
        id
    }

    /// Add a file on disk: its path becomes the URI, the file stem the title
    /// and the parent directory name the album.
    pub fn insert_file(&self, path: &Path) -> TrackId {
        let uri = path.to_string_lossy().into_owned();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| uri.clone());
        let album = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.insert([(META_URI, uri), (META_TITLE, title), (META_ALBUM, album)])
    }

    pub fn set_meta(&self, id: TrackId, key: &str, value: &str) -> bool {
        let mut tracks = self.tracks.write().unwrap_or_else(PoisonError::into_inner);
        match tracks.get_mut(&id) {
            Some(fields) => {
                fields.insert(key.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    /// Acquire a reference to a known track.
    pub fn track_ref(self: &Arc<Self>, id: TrackId) -> Option<TrackRef> {
        let known = self
            .tracks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id);
        if !known {
            return None;
        }
        let store: Arc<dyn TrackStore> = self.clone();
        Some(TrackRef::acquire(store, id))
    }

    pub fn ref_count(&self, id: TrackId) -> usize {
        self.refs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(0)
    }

    pub fn acquired_total(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    pub fn released_total(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.tracks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TrackStore for MemoryPlaylist {
    fn acquire(&self, id: TrackId) {
        let mut refs = self.refs.lock().unwrap_or_else(PoisonError::into_inner);
        *refs.entry(id).or_insert(0) += 1;
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    fn release(&self, id: TrackId) {
        let mut refs = self.refs.lock().unwrap_or_else(PoisonError::into_inner);
        match refs.get_mut(&id) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    refs.remove(&id);
                }
                self.released.fetch_add(1, Ordering::Relaxed);
            }
            _ => warn!("release of unreferenced track {id}"),
        }
    }

    fn find_meta(&self, id: TrackId, key: &str) -> Option<String> {
        let tracks = self.tracks.read().unwrap_or_else(PoisonError::into_inner);
        tracks.get(&id).and_then(|fields| fields.get(key)).cloned()
    }
}
