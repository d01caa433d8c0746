//! Participant identifiers, range slots and assignments

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier of one participant of a run, in `[0, total_participants)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(u32);

impl ParticipantId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for ParticipantId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a candidate range: a real participant or a sentinel.
///
/// Variant order matches the raw integer order (`-2 < -1 < ids`), so sorting
/// a range of slots sorts it exactly like its raw form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// Filler appended to make an odd range even (raw `-2`)
    Padding,
    /// No eligible partner existed for the draw (raw `-1`)
    NoPartner,
    Participant(ParticipantId),
}

impl Slot {
    pub const NO_PARTNER_RAW: i64 = -1;
    pub const PADDING_RAW: i64 = -2;

    /// Raw integer form used by the benchmarking loop
    pub fn as_raw(self) -> i64 {
        match self {
            Slot::Padding => Self::PADDING_RAW,
            Slot::NoPartner => Self::NO_PARTNER_RAW,
            Slot::Participant(id) => i64::from(id.get()),
        }
    }

    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            Self::PADDING_RAW => Some(Slot::Padding),
            Self::NO_PARTNER_RAW => Some(Slot::NoPartner),
            _ => u32::try_from(raw)
                .ok()
                .map(|id| Slot::Participant(ParticipantId(id))),
        }
    }

    pub fn participant(self) -> Option<ParticipantId> {
        match self {
            Slot::Participant(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_sentinel(self) -> bool {
        !matches!(self, Slot::Participant(_))
    }
}

impl From<ParticipantId> for Slot {
    fn from(id: ParticipantId) -> Self {
        Slot::Participant(id)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Slot::from_raw(raw)
            .ok_or_else(|| de::Error::custom(format!("{raw} is neither a participant nor a sentinel")))
    }
}

/// Ordered pair produced by one draw; serialized as a two element array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment(pub Slot, pub Slot);

impl Assignment {
    /// Both slots empty: the participant takes no part in this draw
    pub const UNASSIGNED: Assignment = Assignment(Slot::NoPartner, Slot::NoPartner);

    pub fn contains(&self, slot: Slot) -> bool {
        self.0 == slot || self.1 == slot
    }

    /// The slot opposite `id`, if `id` is part of this assignment
    pub fn partner_of(&self, id: ParticipantId) -> Option<Slot> {
        let me = Slot::from(id);
        if self.0 == me {
            Some(self.1)
        } else if self.1 == me {
            Some(self.0)
        } else {
            None
        }
    }

    /// True when the assignment names the same two slots as `other`, in any order
    pub fn same_pair(&self, other: &Assignment) -> bool {
        (self.0 == other.0 && self.1 == other.1) || (self.0 == other.1 && self.1 == other.0)
    }

    pub fn as_raw(&self) -> [i64; 2] {
        [self.0.as_raw(), self.1.as_raw()]
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}
