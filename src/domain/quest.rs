/// Name-keyed quest pool.
///
/// Each NPC owns at most one quest at a time. A quest advances on every
/// catch of its species until it reaches the requirement, then waits for
/// the player to return to the NPC, which frees the slot.

use log::{info, warn};

use super::species::Species;

pub const MAX_QUESTS: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuestError {
    #[error("{npc} already has an active quest")]
    AlreadyActive { npc: String },
    #[error("quest pool is full")]
    PoolFull,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quest {
    pub npc_name: String,
    pub species: Species,
    pub required: u32,
    pub progress: u32,
    pub is_completed: bool,
}

impl Quest {
    pub fn is_ready(&self) -> bool {
        self.progress >= self.required
    }

    /// HUD line, e.g. `Bears: 2/5`.
    pub fn progress_line(&self) -> String {
        format!("{}: {}/{}", self.species.plural(), self.progress.min(self.required), self.required)
    }
}

#[derive(Default)]
pub struct QuestTracker {
    slots: [Option<Quest>; MAX_QUESTS],
}

impl QuestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> impl Iterator<Item = &Quest> {
        self.slots.iter().flatten()
    }

    pub fn get_by_npc(&self, npc: &str) -> Option<&Quest> {
        self.active().find(|q| q.npc_name == npc)
    }

    /// Returns the slot the quest landed in.
    pub fn start(&mut self, npc: &str, species: Species, required: u32) -> Result<usize, QuestError> {
        if self.get_by_npc(npc).is_some() {
            warn!("Quest: {} already has an active quest", npc);
            return Err(QuestError::AlreadyActive { npc: npc.to_string() });
        }
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            warn!("Quest: no free slot for {}", npc);
            return Err(QuestError::PoolFull);
        };

        self.slots[slot] = Some(Quest {
            npc_name: npc.to_string(),
            species,
            required,
            progress: 0,
            is_completed: required == 0,
        });
        info!("Quest started: {} wants {} {}", npc, required, species.plural());
        Ok(slot)
    }

    /// Advance every open quest for `species` by one. Returns the slots
    /// that completed on this catch.
    pub fn on_catch(&mut self, species: Species) -> Vec<usize> {
        let mut completed = Vec::new();
        for (i, q) in self.slots.iter_mut().enumerate() {
            let Some(q) = q else { continue };
            if q.species != species || q.is_completed {
                continue;
            }
            q.progress += 1;
            info!("Quest progress: {} {}", q.npc_name, q.progress_line());
            if q.progress >= q.required {
                q.is_completed = true;
                info!("Quest complete: return to {}", q.npc_name);
                completed.push(i);
            }
        }
        completed
    }

    pub fn slot(&self, i: usize) -> Option<&Quest> {
        self.slots.get(i).and_then(Option::as_ref)
    }

    /// Free the NPC's slot if its quest is ready. Returns the finished quest.
    pub fn finalize_on_turn_in(&mut self, npc: &str) -> Option<Quest> {
        let slot = self.slots.iter_mut().find(|s| {
            s.as_ref().is_some_and(|q| q.npc_name == npc && q.is_ready())
        })?;
        let quest = slot.take();
        info!("Quest turned in to {}", npc);
        quest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_quest_per_npc() {
        let mut t = QuestTracker::new();
        assert_eq!(t.start("TA Navid", Species::Raccoon, 3), Ok(0));
        assert_eq!(
            t.start("TA Navid", Species::Bear, 1),
            Err(QuestError::AlreadyActive { npc: "TA Navid".into() })
        );
        assert_eq!(t.active().count(), 1);
        assert_eq!(t.get_by_npc("TA Navid").unwrap().species, Species::Raccoon);
    }

    #[test]
    fn pool_full_rejects_fourth() {
        let mut t = QuestTracker::new();
        t.start("a", Species::Bear, 1).unwrap();
        t.start("b", Species::Bear, 1).unwrap();
        t.start("c", Species::Bear, 1).unwrap();
        assert_eq!(t.start("d", Species::Bear, 1), Err(QuestError::PoolFull));
    }

    #[test]
    fn catch_advances_every_matching_quest() {
        let mut t = QuestTracker::new();
        t.start("a", Species::Deer, 2).unwrap();
        t.start("b", Species::Deer, 1).unwrap();
        t.start("c", Species::Bear, 1).unwrap();

        assert_eq!(t.on_catch(Species::Deer), vec![1]);
        assert_eq!(t.get_by_npc("a").unwrap().progress, 1);
        assert_eq!(t.get_by_npc("c").unwrap().progress, 0);

        // completed quests stop counting
        assert_eq!(t.on_catch(Species::Deer), vec![0]);
        assert_eq!(t.get_by_npc("b").unwrap().progress, 1);
        assert!(t.on_catch(Species::Deer).is_empty());
    }

    #[test]
    fn turn_in_frees_slot_only_when_ready() {
        let mut t = QuestTracker::new();
        t.start("Professor Matthew", Species::BigDeer, 2).unwrap();
        assert!(t.finalize_on_turn_in("Professor Matthew").is_none());

        t.on_catch(Species::BigDeer);
        assert_eq!(t.get_by_npc("Professor Matthew").unwrap().progress_line(), "Big Deer: 1/2");
        t.on_catch(Species::BigDeer);
        assert!(t.get_by_npc("Professor Matthew").unwrap().is_completed);

        let done = t.finalize_on_turn_in("Professor Matthew").unwrap();
        assert_eq!(done.progress, 2);
        assert!(t.get_by_npc("Professor Matthew").is_none());
        assert_eq!(t.start("Professor Matthew", Species::BigDeer, 2), Ok(0));
    }

    #[test]
    fn progress_line_uses_plural() {
        let q = Quest {
            npc_name: "TA Soroush".into(),
            species: Species::Bear,
            required: 5,
            progress: 2,
            is_completed: false,
        };
        assert_eq!(q.progress_line(), "Bears: 2/5");
    }
}
