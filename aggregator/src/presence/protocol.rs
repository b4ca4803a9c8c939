//! Chat-service payloads and the normalised presence contract.
//!
//! Every upstream field is optional; decoding never fails on a missing or
//! null field, and normalisation substitutes empty defaults.

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DiscordUser {
    pub id: Option<String>,
    pub username: Option<String>,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub discriminator: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DiscordMember {
    pub nick: Option<String>,
    pub roles: Option<Vec<String>>,
    pub joined_at: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DiscordPresence {
    pub status: Option<String>,
    pub activities: Option<Vec<DiscordActivity>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DiscordActivity {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<i64>,
    pub details: Option<String>,
    pub state: Option<String>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Idle,
    Dnd,
    Offline,
}

impl PresenceStatus {
    /// `None` for anything the chat service may add later.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "online" => Some(PresenceStatus::Online),
            "idle" => Some(PresenceStatus::Idle),
            "dnd" | "do-not-disturb" | "do_not_disturb" => Some(PresenceStatus::Dnd),
            "offline" | "invisible" => Some(PresenceStatus::Offline),
            _ => None,
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Game,
    Listening,
    Generic,
}

impl From<i64> for ActivityKind {
    fn from(tag: i64) -> Self {
        match tag {
            0 => ActivityKind::Game,
            2 => ActivityKind::Listening,
            _ => ActivityKind::Generic,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: i64,
    pub kind: ActivityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Presence {
    pub status: PresenceStatus,
    pub activities: Vec<Activity>,
}

impl Presence {
    pub fn offline() -> Self {
        Presence {
            status: PresenceStatus::Offline,
            activities: Vec::new(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub nickname: String,
    pub roles: Vec<String>,
    pub joined_at: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceResponse {
    pub id: String,
    pub username: String,
    pub global_name: String,
    pub avatar: String,
    pub discriminator: String,
    pub presence: Presence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<Member>,
}

fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Option<T> {
    serde_json::from_slice(body).ok()
}

pub fn normalize_presence(raw: DiscordPresence) -> Presence {
    let status = raw
        .status
        .as_deref()
        .and_then(PresenceStatus::parse)
        .unwrap_or(PresenceStatus::Offline);

    let activities = raw
        .activities
        .unwrap_or_default()
        .into_iter()
        .map(|activity| {
            let type_tag = activity.kind.unwrap_or(-1);
            Activity {
                name: activity.name.unwrap_or_default(),
                type_tag,
                kind: ActivityKind::from(type_tag),
                details: activity.details,
                state: activity.state,
            }
        })
        .collect();

    Presence { status, activities }
}

/// Primary lookup: only a recognised, non-offline status counts.
pub fn decode_live_presence(body: &[u8]) -> Option<Presence> {
    let raw: DiscordPresence = decode(body)?;
    match raw.status.as_deref().and_then(PresenceStatus::parse) {
        Some(PresenceStatus::Offline) | None => None,
        Some(_) => Some(normalize_presence(raw)),
    }
}

/// Secondary lookup: any payload carrying a status is the last known state.
pub fn decode_last_known_presence(body: &[u8]) -> Option<Presence> {
    let raw: DiscordPresence = decode(body)?;
    raw.status.is_some().then(|| normalize_presence(raw))
}

pub fn normalize_member(raw: DiscordMember) -> Member {
    Member {
        nickname: raw.nick.unwrap_or_default(),
        roles: raw.roles.unwrap_or_default(),
        joined_at: raw.joined_at.unwrap_or_default(),
    }
}

pub fn decode_member(body: &[u8]) -> Option<Member> {
    decode::<DiscordMember>(body).map(normalize_member)
}

/// Display name falls back to the username when no global name is set.
pub fn normalize_user(
    user: DiscordUser,
    presence: Presence,
    member: Option<Member>,
) -> PresenceResponse {
    let username = user.username.unwrap_or_default();
    let global_name = user
        .global_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| username.clone());

    PresenceResponse {
        id: user.id.unwrap_or_default(),
        username,
        global_name,
        avatar: user.avatar.unwrap_or_default(),
        discriminator: user.discriminator.unwrap_or_default(),
        presence,
        member,
    }
}
