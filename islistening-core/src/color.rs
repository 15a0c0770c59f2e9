//! Background tints derived from a track's artwork color or its id.
//!
//! Both tint functions are pure. [`ColorTinter`] memoizes them for the render
//! loop with a bounded cache per function.

use crate::status::PlaybackStatus;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Near-white returned when there is nothing to derive a tint from.
pub const DEFAULT_TINT: &str = "#FFF";

/// Default number of entries kept per memoized function.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

fn tint(r: u8, g: u8, b: u8) -> String {
    format!("rgb({r}, {g}, {b}, 0.2)")
}

/// Parse the leading hex digits of `input` into a 32-bit value.
///
/// Mirrors a lenient base-16 integer parse: leading whitespace and a single
/// `#` are skipped, parsing stops at the first non-hex character, and no
/// digits at all yields 0. Overlong input wraps.
fn parse_hex_prefix(input: &str) -> u32 {
    let trimmed = input.trim_start();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    digits
        .chars()
        .map_while(|c| c.to_digit(16))
        .fold(0_u32, |acc, digit| acc.wrapping_mul(16).wrapping_add(digit))
}

/// Map a hex RGB string (e.g. `"ff0000"`) to a low-alpha tint.
#[must_use]
pub fn hex_to_rgba_tint(hex: Option<&str>) -> String {
    match hex {
        None | Some("") => DEFAULT_TINT.to_string(),
        Some(hex) => {
            let [_, r, g, b] = parse_hex_prefix(hex).to_be_bytes();
            tint(r, g, b)
        }
    }
}

/// Derive a deterministic tint from an arbitrary id string.
#[must_use]
pub fn id_to_color_tint(id: &str) -> String {
    if id.is_empty() {
        return DEFAULT_TINT.to_string();
    }

    // 32-bit string hash over UTF-16 code units: hash * 31 + unit
    let hash = id.encode_utf16().fold(0_i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });

    let [c0, c1, c2, _] = hash.to_le_bytes();
    tint(c0, c1, c2)
}

/// Bounded memo table. When full, the oldest inserted entry is evicted.
#[derive(Debug)]
pub struct TintCache {
    capacity: usize,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl TintCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with(&mut self, key: &str, compute: impl FnOnce() -> String) -> String {
        if let Some(value) = self.entries.get(key) {
            return value.clone();
        }

        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }

        let value = compute();
        self.entries.insert(key.to_string(), value.clone());
        self.order.push_back(key.to_string());
        value
    }
}

/// Memoized access to the tint functions, shared by the renderer.
#[derive(Debug)]
pub struct ColorTinter {
    hex: Mutex<TintCache>,
    id: Mutex<TintCache>,
}

impl ColorTinter {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            hex: Mutex::new(TintCache::new(capacity)),
            id: Mutex::new(TintCache::new(capacity)),
        }
    }

    /// Memoized [`hex_to_rgba_tint`].
    pub fn hex_tint(&self, hex: Option<&str>) -> String {
        match hex {
            None | Some("") => DEFAULT_TINT.to_string(),
            Some(hex) => self
                .hex
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get_or_insert_with(hex, || hex_to_rgba_tint(Some(hex))),
        }
    }

    /// Memoized [`id_to_color_tint`].
    pub fn id_tint(&self, id: &str) -> String {
        if id.is_empty() {
            return DEFAULT_TINT.to_string();
        }
        self.id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(id, || id_to_color_tint(id))
    }

    /// Background for a status: the artwork color when the endpoint sent one,
    /// otherwise a tint derived from the track id.
    pub fn background_for(&self, status: &PlaybackStatus) -> String {
        match status.background_color.as_deref() {
            Some(hex) if !hex.is_empty() => self.hex_tint(Some(hex)),
            _ => self.id_tint(&status.id),
        }
    }
}

impl Default for ColorTinter {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
