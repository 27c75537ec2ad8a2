use meshroom_core::{Member, ParticipantId, RoomId};

/// Membership of one room, in join order.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    members: Vec<Member>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, participant_id: &ParticipantId) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| &m.participant_id == participant_id)
    }

    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.member(participant_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Adds `member` and returns everyone who was already present.
    pub(crate) fn admit(&mut self, member: Member) -> Vec<Member> {
        let existing = self
            .members
            .iter()
            .filter(|m| m.participant_id != member.participant_id)
            .cloned()
            .collect();

        if !self.contains(&member.participant_id) {
            self.members.push(member);
        }
        existing
    }

    pub(crate) fn remove(&mut self, participant_id: &ParticipantId) -> Option<Member> {
        let pos = self
            .members
            .iter()
            .position(|m| &m.participant_id == participant_id)?;
        Some(self.members.remove(pos))
    }
}
