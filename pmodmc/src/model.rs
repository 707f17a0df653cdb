use crate::channel::ActionOutput;
use crate::errors::ControlError;
use crate::time_utils::parse_hhmmss_ms;

/// AVTransport `TransportState` values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransportState {
    Stopped,
    Playing,
    Transitioning,
    PausedPlayback,
    PausedRecording,
    Recording,
    NoMediaPresent,
    Unknown(String),
}

impl TransportState {
    pub fn from_upnp(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "STOPPED" => TransportState::Stopped,
            "PLAYING" => TransportState::Playing,
            "TRANSITIONING" => TransportState::Transitioning,
            "PAUSED_PLAYBACK" => TransportState::PausedPlayback,
            "PAUSED_RECORDING" => TransportState::PausedRecording,
            "RECORDING" => TransportState::Recording,
            "NO_MEDIA_PRESENT" => TransportState::NoMediaPresent,
            _ => TransportState::Unknown(raw.to_string()),
        }
    }

    pub fn as_upnp(&self) -> &str {
        match self {
            TransportState::Stopped => "STOPPED",
            TransportState::Playing => "PLAYING",
            TransportState::Transitioning => "TRANSITIONING",
            TransportState::PausedPlayback => "PAUSED_PLAYBACK",
            TransportState::PausedRecording => "PAUSED_RECORDING",
            TransportState::Recording => "RECORDING",
            TransportState::NoMediaPresent => "NO_MEDIA_PRESENT",
            TransportState::Unknown(raw) => raw,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }
}

/// Result of AVTransport `GetTransportInfo`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportInfo {
    pub current_transport_state: TransportState,
    pub current_transport_status: String,
    pub current_speed: String,
}

impl TransportInfo {
    pub fn from_output(output: &ActionOutput) -> Result<Self, ControlError> {
        Ok(Self {
            current_transport_state: TransportState::from_upnp(
                output.require("CurrentTransportState")?,
            ),
            current_transport_status: output
                .text("CurrentTransportStatus")
                .unwrap_or_else(|| "OK".to_string()),
            current_speed: output.text("CurrentSpeed").unwrap_or_else(|| "1".to_string()),
        })
    }
}

/// Result of AVTransport `GetPositionInfo`.
///
/// Times stay in their `HH:MM:SS` form; the `*_ms` helpers convert them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionInfo {
    pub track: u32,
    pub track_duration: Option<String>,
    pub track_metadata: Option<String>,
    pub track_uri: Option<String>,
    pub rel_time: Option<String>,
    pub abs_time: Option<String>,
    pub rel_count: Option<i32>,
    pub abs_count: Option<i32>,
}

impl PositionInfo {
    pub fn from_output(output: &ActionOutput) -> Result<Self, ControlError> {
        let track = match output.text("Track") {
            Some(text) => text
                .parse::<u32>()
                .map_err(|_| ControlError::invalid_output_argument("Track", &text))?,
            None => 0,
        };

        Ok(Self {
            track,
            track_duration: output.text("TrackDuration"),
            track_metadata: output.text("TrackMetaData"),
            track_uri: output.text("TrackURI"),
            rel_time: output.text("RelTime"),
            abs_time: output.text("AbsTime"),
            rel_count: output.text("RelCount").and_then(|t| t.parse().ok()),
            abs_count: output.text("AbsCount").and_then(|t| t.parse().ok()),
        })
    }

    pub fn track_duration_ms(&self) -> u64 {
        self.track_duration.as_deref().map(parse_hhmmss_ms).unwrap_or(0)
    }

    pub fn rel_time_ms(&self) -> u64 {
        self.rel_time.as_deref().map(parse_hhmmss_ms).unwrap_or(0)
    }

    pub fn abs_time_ms(&self) -> u64 {
        self.abs_time.as_deref().map(parse_hhmmss_ms).unwrap_or(0)
    }

    /// Elapsed part of the track, 0..=100. `None` if the duration is unknown.
    pub fn elapsed_percent(&self) -> Option<u8> {
        let duration = self.track_duration_ms();
        if duration == 0 {
            return None;
        }
        let elapsed = self.rel_time_ms().min(duration);
        Some((u128::from(elapsed) * 100 / u128::from(duration)) as u8)
    }
}

/// Result of AVTransport `GetMediaInfo`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaInfo {
    pub nr_tracks: u32,
    pub media_duration: Option<String>,
    pub current_uri: Option<String>,
    pub current_uri_metadata: Option<String>,
    pub next_uri: Option<String>,
    pub next_uri_metadata: Option<String>,
    pub play_medium: Option<String>,
    pub record_medium: Option<String>,
    pub write_status: Option<String>,
}

impl MediaInfo {
    pub fn from_output(output: &ActionOutput) -> Result<Self, ControlError> {
        let nr_tracks = match output.text("NrTracks") {
            Some(text) => text
                .parse::<u32>()
                .map_err(|_| ControlError::invalid_output_argument("NrTracks", &text))?,
            None => 0,
        };

        Ok(Self {
            nr_tracks,
            media_duration: output.text("MediaDuration"),
            current_uri: output.text("CurrentURI"),
            current_uri_metadata: output.text("CurrentURIMetaData"),
            next_uri: output.text("NextURI"),
            next_uri_metadata: output.text("NextURIMetaData"),
            play_medium: output.text("PlayMedium"),
            record_medium: output.text("RecordMedium"),
            write_status: output.text("WriteStatus"),
        })
    }

    pub fn media_duration_ms(&self) -> u64 {
        self.media_duration.as_deref().map(parse_hhmmss_ms).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_info_extracts_fields() {
        let output = ActionOutput::new()
            .with("CurrentTransportState", "PAUSED_PLAYBACK")
            .with("CurrentTransportStatus", "OK")
            .with("CurrentSpeed", "1");

        let info = TransportInfo::from_output(&output).unwrap();
        assert_eq!(info.current_transport_state, TransportState::PausedPlayback);
        assert_eq!(info.current_transport_status, "OK");
        assert_eq!(info.current_speed, "1");
    }

    #[test]
    fn transport_info_requires_state() {
        let err = TransportInfo::from_output(&ActionOutput::new()).unwrap_err();
        assert_eq!(
            err,
            ControlError::missing_output_argument("CurrentTransportState")
        );
    }

    #[test]
    fn unknown_transport_state_is_kept_verbatim() {
        let state = TransportState::from_upnp("VENDOR_BUFFERING");
        assert_eq!(state, TransportState::Unknown("VENDOR_BUFFERING".to_string()));
        assert_eq!(state.as_upnp(), "VENDOR_BUFFERING");
        assert!(TransportState::from_upnp("playing").is_playing());
    }

    #[test]
    fn position_info_tolerates_not_implemented_times() {
        let output = ActionOutput::new()
            .with("Track", "1")
            .with("TrackDuration", "00:03:20")
            .with("TrackURI", "http://x/song.flac")
            .with("RelTime", "00:01:40")
            .with("AbsTime", "NOT_IMPLEMENTED")
            .with("RelCount", "2147483647")
            .with("AbsCount", "");

        let info = PositionInfo::from_output(&output).unwrap();
        assert_eq!(info.track, 1);
        assert_eq!(info.track_uri.as_deref(), Some("http://x/song.flac"));
        assert_eq!(info.track_duration_ms(), 200_000);
        assert_eq!(info.rel_time_ms(), 100_000);
        assert_eq!(info.abs_time_ms(), 0);
        assert_eq!(info.rel_count, Some(i32::MAX));
        assert_eq!(info.abs_count, None);
        assert_eq!(info.elapsed_percent(), Some(50));
    }

    #[test]
    fn elapsed_percent_handles_very_long_tracks() {
        let output = ActionOutput::new()
            .with("TrackDuration", "100000000000:00:00")
            .with("RelTime", "50000000000:00:00");

        let info = PositionInfo::from_output(&output).unwrap();
        assert_eq!(info.elapsed_percent(), Some(50));

        let full = PositionInfo {
            rel_time: info.track_duration.clone(),
            ..info
        };
        assert_eq!(full.elapsed_percent(), Some(100));
    }

    #[test]
    fn position_info_rejects_bad_track_number() {
        let output = ActionOutput::new().with("Track", "first");
        assert!(PositionInfo::from_output(&output).is_err());
    }

    #[test]
    fn media_info_extracts_fields() {
        let output = ActionOutput::new()
            .with("NrTracks", "1")
            .with("MediaDuration", "00:45:00")
            .with("CurrentURI", "http://x/video.mp4")
            .with("CurrentURIMetaData", "")
            .with("PlayMedium", "NETWORK");

        let info = MediaInfo::from_output(&output).unwrap();
        assert_eq!(info.nr_tracks, 1);
        assert_eq!(info.current_uri.as_deref(), Some("http://x/video.mp4"));
        assert_eq!(info.current_uri_metadata, None);
        assert_eq!(info.play_medium.as_deref(), Some("NETWORK"));
        assert_eq!(info.media_duration_ms(), 2_700_000);
    }
}
