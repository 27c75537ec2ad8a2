use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Connection-scoped identity issued by the relay. Unique per active channel.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid participant id '{input}'")]
pub struct IdParseError {
    input: String,
    #[source]
    source: uuid::Error,
}

impl FromStr for ParticipantId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self).map_err(|source| IdParseError {
            input: s.to_owned(),
            source,
        })
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application-level profile supplied by the identity collaborator.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Participant {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// A profile with neither a display name nor an email is treated as "not signed in".
    pub fn is_empty(&self) -> bool {
        self.display_name.trim().is_empty()
            && self.email.as_deref().is_none_or(|e| e.trim().is_empty())
    }
}

/// A room member as the relay reports it: connection id plus profile.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub participant_id: ParticipantId,
    pub participant: Participant,
}

impl Member {
    pub fn new(participant_id: ParticipantId, participant: Participant) -> Self {
        Self {
            participant_id,
            participant,
        }
    }
}
