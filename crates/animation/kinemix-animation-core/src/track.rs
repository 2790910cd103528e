//! Keyframe tracks: flat `(time, value...)` key storage with cached interval lookup.
//!
//! Keys are stored back to back in one `Vec<f32>`, each key being one time
//! followed by `floats_per_key - 1` value components. Per-frame queries move
//! forward slowly, so the last resolved interval is remembered and checked
//! (with its two neighbours) before falling back to a binary search.

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;
use crate::interp::ChannelKind;
use crate::Result;

/// Serialized form of a track. Validated on the way into [`KeyframeTrack`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackData {
    pub kind: ChannelKind,
    pub floats_per_key: usize,
    pub keys: Vec<f32>,
}

/// A fixed-length sequence of keyframes for one animated channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "TrackData", into = "TrackData")]
pub struct KeyframeTrack {
    kind: ChannelKind,
    floats_per_key: usize,
    keys: Vec<f32>,
    /// Interval `[key(i), key(i + 1))` resolved by the previous lookup.
    last_key_index: Option<usize>,
}

impl KeyframeTrack {
    /// Build a track from flat key data.
    ///
    /// `keys.len()` must be a whole number of keys of `floats_per_key` floats,
    /// with at least one key, and key times must be non-decreasing.
    pub fn new(keys: Vec<f32>, floats_per_key: usize, kind: ChannelKind) -> Result<Self> {
        if floats_per_key < 2 {
            return Err(AnimationError::InvalidKeySize { floats_per_key });
        }
        if !kind.supports_width(floats_per_key - 1) {
            return Err(AnimationError::UnsupportedChannel {
                kind,
                value_width: floats_per_key - 1,
            });
        }
        if keys.len() < floats_per_key {
            return Err(AnimationError::NotEnoughKeyData {
                len: keys.len(),
                floats_per_key,
            });
        }
        if keys.len() % floats_per_key != 0 {
            return Err(AnimationError::PartialKeyData {
                len: keys.len(),
                floats_per_key,
            });
        }
        let track = Self {
            kind,
            floats_per_key,
            keys,
            last_key_index: None,
        };
        track.validate_order()?;
        Ok(track)
    }

    /// Build a zeroed track of `num_keys` keys, to be filled with [`set_key`](Self::set_key).
    pub fn with_num_keys(num_keys: usize, floats_per_key: usize, kind: ChannelKind) -> Result<Self> {
        Self::new(vec![0.0; num_keys * floats_per_key], floats_per_key, kind)
    }

    /// Build a track from `(time, value)` pairs of a fixed width.
    pub fn from_keys<const N: usize>(kind: ChannelKind, keys: &[(f32, [f32; N])]) -> Result<Self> {
        let floats_per_key = N + 1;
        let mut flat = Vec::with_capacity(keys.len() * floats_per_key);
        for (time, value) in keys {
            flat.push(*time);
            flat.extend_from_slice(value);
        }
        Self::new(flat, floats_per_key, kind)
    }

    /// Linear track of 3-component keys (positions, scales).
    pub fn vec3(keys: &[(f32, [f32; 3])]) -> Result<Self> {
        Self::from_keys(ChannelKind::Linear, keys)
    }

    /// Spherical track of (x, y, z, w) quaternion keys.
    pub fn quat(keys: &[(f32, [f32; 4])]) -> Result<Self> {
        Self::from_keys(ChannelKind::Spherical, keys)
    }

    /// Linear track of scalar keys.
    pub fn scalar(keys: &[(f32, f32)]) -> Result<Self> {
        let flat: Vec<(f32, [f32; 1])> = keys.iter().map(|(t, v)| (*t, [*v])).collect();
        Self::from_keys(ChannelKind::Linear, &flat)
    }

    #[inline]
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    #[inline]
    pub fn floats_per_key(&self) -> usize {
        self.floats_per_key
    }

    /// Number of value floats per key (the key without its time).
    #[inline]
    pub fn value_width(&self) -> usize {
        self.floats_per_key - 1
    }

    #[inline]
    pub fn num_keys(&self) -> usize {
        self.keys.len() / self.floats_per_key
    }

    /// Time span between the first and last key.
    pub fn duration(&self) -> f32 {
        self.key_time(self.num_keys() - 1) - self.key_time(0)
    }

    #[inline]
    pub fn start_time(&self) -> f32 {
        self.key_time(0)
    }

    #[inline]
    pub fn end_time(&self) -> f32 {
        self.key_time(self.num_keys() - 1)
    }

    /// Time of key `index`. Panics if `index >= num_keys()`.
    #[inline]
    pub fn key_time(&self, index: usize) -> f32 {
        self.keys[index * self.floats_per_key]
    }

    /// Value components of key `index`. Panics if `index >= num_keys()`.
    #[inline]
    pub fn key_values(&self, index: usize) -> &[f32] {
        let ofs = index * self.floats_per_key;
        &self.keys[ofs + 1..ofs + self.floats_per_key]
    }

    /// Overwrite one key in place. The track keeps its length and key order.
    pub fn set_key(&mut self, index: usize, time: f32, values: &[f32]) -> Result<()> {
        self.check_index(index)?;
        self.check_width(values.len())?;
        self.check_time_fits(index, time)?;
        let ofs = index * self.floats_per_key;
        self.keys[ofs] = time;
        self.keys[ofs + 1..ofs + self.floats_per_key].copy_from_slice(values);
        Ok(())
    }

    pub fn set_key_time(&mut self, index: usize, time: f32) -> Result<()> {
        self.check_index(index)?;
        self.check_time_fits(index, time)?;
        self.keys[index * self.floats_per_key] = time;
        Ok(())
    }

    pub fn set_key_values(&mut self, index: usize, values: &[f32]) -> Result<()> {
        self.check_index(index)?;
        self.check_width(values.len())?;
        let ofs = index * self.floats_per_key + 1;
        self.keys[ofs..ofs + values.len()].copy_from_slice(values);
        Ok(())
    }

    /// Sample the track at `time` into a new vector.
    pub fn sample(&mut self, time: f32) -> Vec<f32> {
        let mut out = vec![0.0; self.value_width()];
        self.sample_into(time, &mut out);
        out
    }

    /// Sample the track at `time` into `dest`, using the cached interval.
    ///
    /// Times before the first key or after the last key clamp to that key's
    /// value; there is no extrapolation. `dest` must hold at least
    /// [`value_width`](Self::value_width) floats.
    pub fn sample_into(&mut self, time: f32, dest: &mut [f32]) {
        let index = match self.bounds_clamp(time) {
            Some(edge) => {
                self.copy_key(edge, dest);
                return;
            }
            None => self.key_index(time),
        };
        self.blend_interval(index, time, dest);
    }

    /// Reference sampling path: binary search only, cache untouched.
    pub fn sample_uncached(&self, time: f32, dest: &mut [f32]) {
        let index = match self.bounds_clamp(time) {
            Some(edge) => {
                self.copy_key(edge, dest);
                return;
            }
            None => self.search_interval(time),
        };
        self.blend_interval(index, time, dest);
    }

    /// Resolve the interval `i` with `key_time(i) <= time < key_time(i + 1)`.
    ///
    /// Tries the cached interval, then its neighbours, then a binary search.
    /// Returns `None` when no interval holds `time`; the cache is then cleared.
    pub fn key_index(&mut self, time: f32) -> Option<usize> {
        if let Some(cached) = self.last_key_index {
            if self.brackets(cached, time) {
                return Some(cached);
            }
            if cached > 0 && self.brackets(cached - 1, time) {
                self.last_key_index = Some(cached - 1);
                return self.last_key_index;
            }
            if self.brackets(cached + 1, time) {
                self.last_key_index = Some(cached + 1);
                return self.last_key_index;
            }
        }
        self.last_key_index = self.search_interval(time);
        self.last_key_index
    }

    /// Binary search for the interval holding `time`, without touching the cache.
    pub fn search_interval(&self, time: f32) -> Option<usize> {
        let n = self.num_keys();
        if n < 2 {
            return None;
        }
        // count of keys with key_time <= time
        let (mut lo, mut hi) = (0usize, n);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key_time(mid) <= time {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo == 0 || lo == n {
            return None;
        }
        let index = lo - 1;
        self.brackets(index, time).then_some(index)
    }

    /// Index cached by the last [`key_index`](Self::key_index) call.
    #[inline]
    pub fn cached_key_index(&self) -> Option<usize> {
        self.last_key_index
    }

    /// Forget the cached interval (e.g. after a seek).
    #[inline]
    pub fn clear_cache(&mut self) {
        self.last_key_index = None;
    }

    #[inline]
    fn brackets(&self, index: usize, time: f32) -> bool {
        index + 1 < self.num_keys()
            && self.key_time(index) <= time
            && time < self.key_time(index + 1)
    }

    /// Endpoint key to clamp to, if `time` lies outside the keyed range.
    #[inline]
    fn bounds_clamp(&self, time: f32) -> Option<usize> {
        let last = self.num_keys() - 1;
        if time <= self.key_time(0) {
            Some(0)
        } else if time >= self.key_time(last) {
            Some(last)
        } else {
            None
        }
    }

    fn blend_interval(&self, index: Option<usize>, time: f32, dest: &mut [f32]) {
        let Some(i) = index else {
            log::warn!("interpolation failed at time {time}; clamping to first key");
            self.copy_key(0, dest);
            return;
        };
        let t0 = self.key_time(i);
        let t1 = self.key_time(i + 1);
        let factor = (time - t0) / (t1 - t0);
        let width = self.value_width();
        self.kind.blend(
            self.key_values(i),
            self.key_values(i + 1),
            factor,
            &mut dest[..width],
        );
    }

    #[inline]
    fn copy_key(&self, index: usize, dest: &mut [f32]) {
        let width = self.value_width();
        dest[..width].copy_from_slice(self.key_values(index));
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let num_keys = self.num_keys();
        if index >= num_keys {
            return Err(AnimationError::KeyIndexOutOfRange { index, num_keys });
        }
        Ok(())
    }

    fn check_width(&self, actual: usize) -> Result<()> {
        let expected = self.value_width();
        if actual != expected {
            return Err(AnimationError::ValueWidthMismatch { expected, actual });
        }
        Ok(())
    }

    fn check_time_fits(&self, index: usize, time: f32) -> Result<()> {
        if index > 0 {
            let previous = self.key_time(index - 1);
            if time < previous {
                return Err(AnimationError::UnorderedKeys {
                    index,
                    time,
                    previous,
                });
            }
        }
        if index + 1 < self.num_keys() {
            let next = self.key_time(index + 1);
            if time > next {
                return Err(AnimationError::UnorderedKeys {
                    index: index + 1,
                    time: next,
                    previous: time,
                });
            }
        }
        Ok(())
    }

    fn validate_order(&self) -> Result<()> {
        for index in 1..self.num_keys() {
            let previous = self.key_time(index - 1);
            let time = self.key_time(index);
            if time < previous {
                return Err(AnimationError::UnorderedKeys {
                    index,
                    time,
                    previous,
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<TrackData> for KeyframeTrack {
    type Error = AnimationError;

    fn try_from(data: TrackData) -> Result<Self> {
        Self::new(data.keys, data.floats_per_key, data.kind)
    }
}

impl From<KeyframeTrack> for TrackData {
    fn from(track: KeyframeTrack) -> Self {
        TrackData {
            kind: track.kind,
            floats_per_key: track.floats_per_key,
            keys: track.keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_keys() -> KeyframeTrack {
        KeyframeTrack::scalar(&[(0.0, 0.0), (1.0, 10.0), (2.0, 5.0), (3.0, 20.0)]).unwrap()
    }

    #[test]
    fn cache_follows_forward_queries() {
        let mut track = four_keys();
        assert_eq!(track.cached_key_index(), None);
        assert_eq!(track.key_index(0.5), Some(0));
        assert_eq!(track.cached_key_index(), Some(0));
        // neighbour step forward and backward
        assert_eq!(track.key_index(1.2), Some(1));
        assert_eq!(track.key_index(0.9), Some(0));
        // large jump goes through binary search
        assert_eq!(track.key_index(2.5), Some(2));
        assert_eq!(track.cached_key_index(), Some(2));
    }

    #[test]
    fn key_index_outside_range_is_none() {
        let mut track = four_keys();
        assert_eq!(track.key_index(-1.0), None);
        assert_eq!(track.key_index(3.0), None);
        assert_eq!(track.cached_key_index(), None);
        assert_eq!(track.key_index(f32::NAN), None);
    }

    #[test]
    fn duplicate_times_are_skipped() {
        let mut track =
            KeyframeTrack::scalar(&[(0.0, 0.0), (1.0, 1.0), (1.0, 5.0), (2.0, 7.0)]).unwrap();
        assert_eq!(track.key_index(1.0), Some(2));
        assert_eq!(track.sample(1.5), vec![6.0]);
    }
}
