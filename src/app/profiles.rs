//! Track profiles.
//!
//! A profile is one (track, lane) pairing the logger has been set up for.
//! Ids are 1-based and sequential; `at` names the profile in use.  The book
//! is stored as compact JSON under `slotlog/profiles`.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app::ports::StoragePort;
use crate::error::StorageError;
use crate::track::TrackTopology;

pub const PROFILE_NAMESPACE: &str = "slotlog";
pub const PROFILE_KEY: &str = "profiles";

/// Largest serialised book accepted.
const MAX_BOOK_BYTES: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u32,
    pub track: String,
    pub lane_count: u8,
    pub lane: u8,
    pub colour: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileBook {
    /// Id of the active profile, `0` when none.
    pub at: u32,
    pub profiles: Vec<Profile>,
}

impl ProfileBook {
    /// Read the book; a missing key is an empty book.
    pub fn load<S: StoragePort + ?Sized>(store: &S) -> Result<Self, StorageError> {
        if !store.exists(PROFILE_NAMESPACE, PROFILE_KEY) {
            return Ok(Self::default());
        }
        let mut buf = [0u8; MAX_BOOK_BYTES];
        let len = store.read(PROFILE_NAMESPACE, PROFILE_KEY, &mut buf)?;
        serde_json::from_slice(&buf[..len]).map_err(|_| StorageError::Corrupted)
    }

    pub fn save<S: StoragePort + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        let data = serde_json::to_vec(self).map_err(|_| StorageError::Corrupted)?;
        if data.len() > MAX_BOOK_BYTES {
            return Err(StorageError::Full);
        }
        store.write(PROFILE_NAMESPACE, PROFILE_KEY, &data)
    }

    /// Append (`id == 0` or past the end) or replace profile `id`, make it
    /// the active one and return its id.
    pub fn put_profile(&mut self, track: &str, topology: &TrackTopology, id: u32) -> u32 {
        let count = self.profiles.len() as u32;
        let id = if id == 0 || id > count { count + 1 } else { id };
        let profile = Profile {
            id,
            track: track.to_string(),
            lane_count: topology.lane_count(),
            lane: topology.my_lane(),
            colour: topology.colour().to_string(),
        };
        if id > count {
            debug!("profiles: appending #{}", id);
            self.profiles.push(profile);
        } else {
            debug!("profiles: replacing #{}", id);
            self.profiles[(id - 1) as usize] = profile;
        }
        self.at = id;
        id
    }

    /// Make profile `id` active.
    pub fn select(&mut self, id: u32) -> Result<&Profile, StorageError> {
        if id == 0 || id as usize > self.profiles.len() {
            return Err(StorageError::NotFound);
        }
        self.at = id;
        Ok(&self.profiles[(id - 1) as usize])
    }

    pub fn active(&self) -> Option<&Profile> {
        self.at
            .checked_sub(1)
            .and_then(|i| self.profiles.get(i as usize))
    }

    /// Store `topology` for `track`, reusing the profile already held for
    /// the same track and lane.
    pub fn record_topology(&mut self, track: &str, topology: &TrackTopology) -> u32 {
        let existing = self
            .profiles
            .iter()
            .find(|p| p.track == track && p.lane_count == topology.lane_count() && p.lane == topology.my_lane())
            .map(|p| p.id)
            .unwrap_or(0);
        let id = self.put_profile(track, topology, existing);
        info!(
            "profiles: '{}' lane {}/{} ({}) is profile #{}",
            track,
            topology.my_lane(),
            topology.lane_count(),
            topology.colour(),
            id
        );
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemStore(HashMap<String, Vec<u8>>);

    impl StoragePort for MemStore {
        fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
            let v = self.0.get(&format!("{ns}/{key}")).ok_or(StorageError::NotFound)?;
            buf[..v.len()].copy_from_slice(v);
            Ok(v.len())
        }
        fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
            self.0.insert(format!("{ns}/{key}"), data.to_vec());
            Ok(())
        }
        fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
            self.0.remove(&format!("{ns}/{key}"));
            Ok(())
        }
        fn exists(&self, ns: &str, key: &str) -> bool {
            self.0.contains_key(&format!("{ns}/{key}"))
        }
    }

    fn topo(lanes: u8, lane: u8) -> TrackTopology {
        TrackTopology::from_capture(lanes, lane).unwrap()
    }

    #[test]
    fn id_zero_appends_with_next_id() {
        let mut book = ProfileBook::default();
        assert_eq!(book.put_profile("fylde", &topo(4, 1), 0), 1);
        assert_eq!(book.put_profile("castle", &topo(5, 2), 0), 2);
        assert_eq!(book.at, 2);
        assert_eq!(book.profiles[1].colour, "blue");
    }

    #[test]
    fn id_past_end_appends() {
        let mut book = ProfileBook::default();
        assert_eq!(book.put_profile("fylde", &topo(4, 1), 9), 1);
    }

    #[test]
    fn existing_id_replaces() {
        let mut book = ProfileBook::default();
        book.put_profile("fylde", &topo(4, 1), 0);
        book.put_profile("castle", &topo(5, 2), 0);
        assert_eq!(book.put_profile("fylde", &topo(4, 3), 1), 1);
        assert_eq!(book.profiles.len(), 2);
        assert_eq!(book.profiles[0].lane, 3);
        assert_eq!(book.at, 1);
    }

    #[test]
    fn select_validates_id() {
        let mut book = ProfileBook::default();
        book.put_profile("fylde", &topo(4, 1), 0);
        book.put_profile("castle", &topo(5, 2), 0);
        assert_eq!(book.select(1).map(|p| p.track.clone()), Ok("fylde".to_string()));
        assert_eq!(book.at, 1);
        assert_eq!(book.select(3), Err(StorageError::NotFound));
        assert_eq!(book.select(0), Err(StorageError::NotFound));
        assert_eq!(book.at, 1);
    }

    #[test]
    fn record_topology_reuses_matching_profile() {
        let mut book = ProfileBook::default();
        let a = book.record_topology("home", &topo(6, 3));
        let b = book.record_topology("home", &topo(6, 3));
        let c = book.record_topology("home", &topo(6, 4));
        assert_eq!((a, b, c), (1, 1, 2));
        assert_eq!(book.active().map(|p| p.colour.as_str()), Some("blue"));
    }

    #[test]
    fn book_survives_storage() {
        let mut store = MemStore::default();
        assert_eq!(ProfileBook::load(&store), Ok(ProfileBook::default()));

        let mut book = ProfileBook::default();
        book.record_topology("home", &topo(6, 3));
        book.save(&mut store).unwrap();
        assert_eq!(ProfileBook::load(&store), Ok(book));
    }

    #[test]
    fn garbage_is_corrupted() {
        let mut store = MemStore::default();
        store.write(PROFILE_NAMESPACE, PROFILE_KEY, b"{not json").unwrap();
        assert_eq!(ProfileBook::load(&store), Err(StorageError::Corrupted));
    }
}
