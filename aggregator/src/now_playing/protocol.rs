//! Music-service payloads and the normalised track contract.

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CurrentlyPlaying {
    pub is_playing: Option<bool>,
    pub item: Option<Track>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct RecentlyPlayed {
    pub items: Option<Vec<PlayHistory>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct PlayHistory {
    pub track: Option<Track>,
    pub played_at: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Track {
    pub name: Option<String>,
    pub artists: Option<Vec<Artist>>,
    pub album: Option<Album>,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Artist {
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Album {
    pub name: Option<String>,
    pub images: Option<Vec<Image>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Image {
    pub url: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// `{"isPlaying":false}` when nothing is known, the full record otherwise.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    pub is_playing: bool,
    #[serde(flatten)]
    pub track: Option<TrackDetails>,
}

impl NowPlaying {
    pub fn idle() -> Self {
        NowPlaying {
            is_playing: false,
            track: None,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackDetails {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_image_url: String,
    pub song_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_played: Option<String>,
}

/// Error body: `{isPlaying:false, error, details?}`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingError {
    pub is_playing: bool,
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn track_details(track: Track, last_played: Option<String>) -> TrackDetails {
    let artist = track
        .artists
        .unwrap_or_default()
        .into_iter()
        .filter_map(|artist| artist.name)
        .collect::<Vec<_>>()
        .join(", ");

    let album = track.album.unwrap_or_default();
    let album_image_url = album
        .images
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|image| image.url)
        .unwrap_or_default();

    TrackDetails {
        title: track.name.unwrap_or_default(),
        artist,
        album: album.name.unwrap_or_default(),
        album_image_url,
        song_url: track
            .external_urls
            .and_then(|urls| urls.spotify)
            .unwrap_or_default(),
        last_played,
    }
}

/// Primary lookup: only a track that is actively playing counts.
pub fn decode_currently_playing(body: &[u8]) -> Option<NowPlaying> {
    let raw: CurrentlyPlaying = serde_json::from_slice(body).ok()?;
    match (raw.is_playing, raw.item) {
        (Some(true), Some(track)) => Some(NowPlaying {
            is_playing: true,
            track: Some(track_details(track, None)),
        }),
        _ => None,
    }
}

/// Secondary lookup: the most recent play, if any.
pub fn decode_recently_played(body: &[u8]) -> Option<NowPlaying> {
    let raw: RecentlyPlayed = serde_json::from_slice(body).ok()?;
    let latest = raw.items.unwrap_or_default().into_iter().next()?;
    let track = latest.track?;

    Some(NowPlaying {
        is_playing: false,
        track: Some(track_details(track, latest.played_at)),
    })
}
