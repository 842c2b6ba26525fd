use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::types::{AudioRef, MediaId};

#[derive(Debug, Clone)]
pub struct MediaBlob {
    pub mime: String,
    pub bytes: Arc<Vec<u8>>,
}

/// Process-local registry of materialized audio bytes.
///
/// This is the in-process analogue of handing out object URLs: captures and
/// inline binary replies are inserted once and referenced by `AudioRef::Local`
/// until the owning message is discarded. Refs must be released explicitly or
/// the bytes stay resident for the whole session.
#[derive(Debug, Default)]
pub struct MediaStore {
    blobs: Mutex<HashMap<MediaId, MediaBlob>>,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, mime: impl Into<String>, bytes: Vec<u8>) -> AudioRef {
        let id = MediaId::new();
        let blob = MediaBlob {
            mime: mime.into(),
            bytes: Arc::new(bytes),
        };
        self.blobs.lock().unwrap().insert(id, blob);
        AudioRef::Local(id)
    }

    /// Resolves a local ref to its bytes. Remote refs are the playback
    /// layer's concern and resolve to `None` here.
    pub fn resolve(&self, audio: &AudioRef) -> Option<MediaBlob> {
        match audio {
            AudioRef::Local(id) => self.blobs.lock().unwrap().get(id).cloned(),
            AudioRef::Remote(_) => None,
        }
    }

    /// Releases the bytes behind a local ref. A no-op for remote refs and
    /// for refs already released.
    pub fn release(&self, audio: &AudioRef) {
        if let AudioRef::Local(id) = audio {
            self.blobs.lock().unwrap().remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_resolve_release_roundtrip() {
        let store = MediaStore::new();
        let r = store.insert("audio/wav", vec![1, 2, 3]);
        assert!(r.is_local());

        let blob = store.resolve(&r).expect("blob resolves");
        assert_eq!(blob.mime, "audio/wav");
        assert_eq!(*blob.bytes, vec![1, 2, 3]);

        store.release(&r);
        assert!(store.resolve(&r).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn remote_refs_do_not_resolve_locally() {
        let store = MediaStore::new();
        let r = AudioRef::Remote("https://example.com/a.mp3".into());
        assert!(store.resolve(&r).is_none());
        store.release(&r);
    }

    #[test]
    fn double_release_is_harmless() {
        let store = MediaStore::new();
        let r = store.insert("audio/mpeg", vec![0]);
        store.release(&r);
        store.release(&r);
        assert!(store.is_empty());
    }
}
