/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and music.

use crate::domain::room::{DoorKind, RoomId};
use crate::domain::species::Species;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    CreatureCaught { species: Species },
    QuestStarted { npc: &'static str },
    QuestCompleted { npc: String },
    QuestTurnedIn { npc: &'static str },
    DialogueOpened { speaker: &'static str },
    DialogueBlip,
    RoomEntered { room: RoomId, door: DoorKind },
    MusicCue { track: &'static str },
    TotalsReset,
}
