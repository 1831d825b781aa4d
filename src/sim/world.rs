/// GameSession: everything a running game owns.
///
/// There are no globals. The world, the player, the creature arena, the
/// quest pool, the dialogue box, the save record and the music selector
/// all live here and are handed to the scheduler and renderer by reference.

use log::info;

use crate::config::{GameConfig, TimingConfig};
use crate::domain::creature::{CreatureManager, Reserved};
use crate::domain::dialogue::DialogueSession;
use crate::domain::layout;
use crate::domain::player::Player;
use crate::domain::quest::QuestTracker;
use crate::domain::room::GridWorld;
use crate::domain::species::PerSpecies;
use super::ambience::Ambience;
use super::save::SaveStore;

/// How long a HUD message stays up, in frames.
pub const MESSAGE_FRAMES: u32 = 60;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Normal,
    /// A dialogue box is open: no movement, catching or room changes.
    DialogueFrozen,
}

pub struct GameSession {
    // ── World ──
    pub world: GridWorld,
    pub player: Player,
    pub creatures: CreatureManager,

    // ── Progress ──
    pub quests: QuestTracker,
    pub save: SaveStore,
    pub targets: PerSpecies<u32>,

    // ── Presentation state ──
    pub dialogue: DialogueSession,
    pub ambience: Ambience,
    pub message: String,
    pub message_timer: u32,

    pub timing: TimingConfig,
    pub frame: u64,
}

impl GameSession {
    pub fn new(config: &GameConfig, save: SaveStore, creatures: CreatureManager) -> Self {
        GameSession {
            world: GridWorld::new(&layout::ROOMS, layout::START_ROOM),
            player: Player::new(layout::START_CELL),
            creatures,
            quests: QuestTracker::new(),
            save,
            targets: config.population,
            dialogue: DialogueSession::new(config.timing.typewriter_ms),
            ambience: Ambience::new(config.timing.music_delay_ms),
            message: String::new(),
            message_timer: 0,
            timing: config.timing.clone(),
            frame: 0,
        }
    }

    /// Initial creature placement. Call once before the first frame.
    pub fn populate(&mut self) {
        let reserved = self.reserved();
        self.creatures.spawn_initial(&self.targets, &self.world, reserved);
        info!(
            "Session ready: ({}, {}) in {}, {} creatures",
            self.player.cell.x, self.player.cell.y,
            self.world.current_room().name,
            self.creatures.active_counts().total(),
        );
    }

    pub fn mode(&self) -> Mode {
        if self.dialogue.is_active() {
            Mode::DialogueFrozen
        } else {
            Mode::Normal
        }
    }

    /// The player's cell, kept clear of spawning creatures.
    pub fn reserved(&self) -> Reserved {
        Some((self.world.current_room_id(), self.player.cell))
    }

    pub fn set_message(&mut self, text: impl Into<String>) {
        self.message = text.into();
        self.message_timer = MESSAGE_FRAMES;
    }

    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}
