use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Snapshot of what the account is playing, as served by the status endpoint.
///
/// Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    /// Whether the track is playing right now (false means most recently played)
    pub is_playing: bool,
    /// Track name
    pub name: String,
    /// Artist name(s)
    pub artist: String,
    /// Album artwork
    pub image: Url,
    /// Outbound link to the track
    pub url: Url,
    /// Provider track id
    pub id: String,
    /// Dominant artwork color as hex RGB without `#`, when the endpoint has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Total track length
    #[serde(rename = "duration_ms", default)]
    pub duration_ms: u64,
    /// Playback position when the upstream snapshot was taken
    #[serde(rename = "progress_ms", default)]
    pub progress_ms: u64,
    /// When the upstream snapshot was taken
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl PlaybackStatus {
    /// Playback position adjusted for the time between the upstream snapshot
    /// and `now`.
    ///
    /// Saturates at 0 if `now` is earlier than the snapshot by more than the
    /// reported progress (clock skew).
    #[must_use]
    pub fn corrected_elapsed(&self, now: DateTime<Utc>) -> u64 {
        let lag_ms = now.signed_duration_since(self.timestamp).num_milliseconds();
        let progress_ms = i64::try_from(self.progress_ms).unwrap_or(i64::MAX);
        u64::try_from(progress_ms.saturating_add(lag_ms)).unwrap_or(0)
    }

    /// Check whether `other` describes the same track
    #[must_use]
    pub fn is_same_track(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A status plus the client-side starting position derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedStatus {
    pub status: PlaybackStatus,
    /// Corrected elapsed time when playing, 0 otherwise
    pub progress_ms: u64,
}

impl FetchedStatus {
    /// Normalize a freshly received status against the local clock.
    #[must_use]
    pub fn normalize(status: PlaybackStatus, now: DateTime<Utc>) -> Self {
        let progress_ms = if status.is_playing {
            status.corrected_elapsed(now)
        } else {
            0
        };
        Self {
            status,
            progress_ms,
        }
    }
}

/// The endpoint forwards the provider's epoch-millisecond timestamp, but an
/// RFC 3339 string is accepted as well.
mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Millis(i64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(
        timestamp: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(timestamp.timestamp_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {ms}"))),
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(de::Error::custom),
        }
    }
}
