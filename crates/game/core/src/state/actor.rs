use super::{RoomId, SessionId, UserId};

/// Character name together with its grammatical rendering rule.
///
/// Proper nouns ("Aldric") are rendered verbatim with a capital initial.
/// Common nouns ("goblin") take the definite article ("the goblin").
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorName {
    text: String,
    proper_noun: bool,
}

impl ActorName {
    /// A player-style name, rendered as given.
    pub fn proper(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            proper_noun: true,
        }
    }

    /// A creature-style name, rendered with "the".
    pub fn common(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            proper_noun: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Renders the name for narrative text.
    ///
    /// `capitalize` selects the sentence-initial form: it only changes the
    /// article of common nouns ("The goblin" vs "the goblin").
    pub fn display(&self, capitalize: bool) -> String {
        if self.proper_noun {
            return capitalize_first(&self.text);
        }
        let article = if capitalize { "The" } else { "the" };
        format!("{article} {}", self.text)
    }

    /// Possessive form: "Aldric's", "the goblin's", "Silas'".
    pub fn possessive(&self, capitalize: bool) -> String {
        let base = self.display(capitalize);
        if base.ends_with('s') || base.ends_with('S') {
            format!("{base}'")
        } else {
            format!("{base}'s")
        }
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Health meter with the `0 <= health <= max_health` invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vitals {
    health: u32,
    max_health: u32,
}

impl Vitals {
    /// Creates a meter, clamping `health` to `max_health`.
    pub fn new(health: u32, max_health: u32) -> Self {
        Self {
            health: health.min(max_health),
            max_health,
        }
    }

    pub fn full(max_health: u32) -> Self {
        Self::new(max_health, max_health)
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn missing(&self) -> u32 {
        self.max_health - self.health
    }

    /// Applies a signed delta and returns the new health, clamped to `[0, max]`.
    pub fn apply_delta(&mut self, delta: i64) -> u32 {
        let next = i64::from(self.health)
            .saturating_add(delta)
            .clamp(0, i64::from(self.max_health));
        // Clamped into [0, max_health], so the cast is lossless.
        self.health = next as u32;
        self.health
    }
}

/// Snapshot of an actor as seen by the casting engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actor {
    pub id: UserId,
    pub name: ActorName,
    pub room: RoomId,
    pub vitals: Vitals,
    /// Live cast owned by this actor, if any. The session is not owned here.
    pub active_session: Option<SessionId>,
}

impl Actor {
    /// Create an actor at full health with no active cast.
    pub fn new(id: UserId, name: ActorName, room: RoomId, max_health: u32) -> Self {
        Self {
            id,
            name,
            room,
            vitals: Vitals::full(max_health),
            active_session: None,
        }
    }

    #[must_use]
    pub fn with_health(mut self, health: u32) -> Self {
        self.vitals = Vitals::new(health, self.vitals.max_health());
        self
    }

    pub fn display_name(&self, capitalize: bool) -> String {
        self.name.display(capitalize)
    }

    pub fn is_casting(&self) -> bool {
        self.active_session.is_some()
    }
}
