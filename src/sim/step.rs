/// The step function: advances the session by one frame.
///
/// Normal frame:
///   1. Interact (NPC dialogue + quest start / progress / turn-in).
///      Opening a dialogue ends the frame's gameplay.
///   2. Catch (adjacent creature → quest progress → save → respawn)
///   3. Movement request + animation
///   4. Door transition (guarded against bouncing straight back)
///
/// Frozen frame (dialogue open):
///   1. Interact confirms (skip typing / close)
///   2. Typewriter tick
///
/// Every frame also handles the totals reset and the music selector.

use crate::domain::grid::Direction;
use crate::domain::player::FrameInput;
use crate::domain::quest::QuestError;
use super::event::GameEvent;
use super::world::{GameSession, Mode};

/// Said by an NPC when every quest slot is taken.
pub const BUSY_LINE: &str =
    "You look busy already. Come back once you've finished one of your other errands.";

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(s: &mut GameSession, input: FrameInput, now_ms: u64) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    s.frame += 1;
    s.tick_message();

    if input.reset {
        resolve_reset(s, &mut events);
    }

    match s.mode() {
        Mode::DialogueFrozen => {
            resolve_dialogue(s, input.interact, now_ms, &mut events);
        }
        Mode::Normal => {
            let opened = input.interact && resolve_interact(s, now_ms, &mut events);
            if !opened {
                if input.catch {
                    resolve_catch(s, &mut events);
                }
                resolve_movement(s, input.direction, now_ms);
                resolve_doors(s, &mut events);
            }
        }
    }

    resolve_music(s, now_ms, &mut events);
    events
}

// ══════════════════════════════════════════════════════════════
// Dialogue
// ══════════════════════════════════════════════════════════════

fn resolve_dialogue(s: &mut GameSession, confirm: bool, now_ms: u64, events: &mut Vec<GameEvent>) {
    if confirm {
        s.dialogue.handle_confirm();
    }
    // blip on every third character
    if s.dialogue.tick(now_ms) && s.dialogue.revealed_len() % 3 == 1 {
        events.push(GameEvent::DialogueBlip);
    }
}

/// Talk to the first adjacent NPC. Returns true if a dialogue opened.
fn resolve_interact(s: &mut GameSession, now_ms: u64, events: &mut Vec<GameEvent>) -> bool {
    let player = s.player.cell;
    let Some(npc) = s.world.current_room().npcs
        .iter()
        .find(|n| !n.caught && n.cell.is_orthogonally_adjacent(player))
        .cloned()
    else {
        return false;
    };

    let ready = s.quests.get_by_npc(npc.name).map(|q| q.is_ready());
    let text = match ready {
        Some(true) => {
            s.quests.finalize_on_turn_in(npc.name);
            s.set_message(format!("Quest turned in to {}", npc.name));
            events.push(GameEvent::QuestTurnedIn { npc: npc.name });
            npc.lines.turn_in
        }
        Some(false) => npc.lines.progress,
        None => match s.quests.start(npc.name, npc.offer.species, npc.offer.required) {
            Ok(_) => {
                s.set_message(format!(
                    "New quest: catch {} {}",
                    npc.offer.required,
                    npc.offer.species.plural()
                ));
                events.push(GameEvent::QuestStarted { npc: npc.name });
                npc.lines.opening
            }
            Err(QuestError::PoolFull) => BUSY_LINE,
            Err(QuestError::AlreadyActive { .. }) => npc.lines.progress,
        },
    };

    s.dialogue.start(npc.name, text, npc.portrait, now_ms);
    events.push(GameEvent::DialogueOpened { speaker: npc.name });
    true
}

// ══════════════════════════════════════════════════════════════
// Catch
// ══════════════════════════════════════════════════════════════

fn resolve_catch(s: &mut GameSession, events: &mut Vec<GameEvent>) {
    let room = s.world.current_room_id();
    let Some(id) = s.creatures.adjacent_to(s.player.cell, room).map(|c| c.id) else {
        s.set_message("Nothing to catch here");
        return;
    };
    let Some(species) = s.creatures.catch(id) else { return };

    events.push(GameEvent::CreatureCaught { species });
    s.set_message(format!("Caught a {}!", species.name()));
    s.save.record_catch(species);

    for slot in s.quests.on_catch(species) {
        if let Some(q) = s.quests.slot(slot) {
            let npc = q.npc_name.clone();
            s.set_message(format!("Quest complete! Return to {}", npc));
            events.push(GameEvent::QuestCompleted { npc });
        }
    }

    let reserved = s.reserved();
    s.creatures.check_respawn(&s.targets, &s.world, reserved);
}

// ══════════════════════════════════════════════════════════════
// Movement / doors
// ══════════════════════════════════════════════════════════════

fn resolve_movement(s: &mut GameSession, direction: Option<Direction>, now_ms: u64) {
    if let Some(dir) = direction {
        let room = s.world.current_room();
        s.player.attempt_step(dir, now_ms, s.timing.move_delay_ms, room, &s.creatures);
    }
    s.player.advance_animation(s.timing.animation_speed);
}

fn resolve_doors(s: &mut GameSession, events: &mut Vec<GameEvent>) {
    let cell = s.player.cell;
    // The logical cell only changes on landing, so leaving the spawn cell
    // clears the guard even mid-step.
    let Some(door) = s.world.door_at(s.world.current_room_id(), cell.x, cell.y) else {
        s.player.just_teleported = false;
        return;
    };
    if s.player.moving || s.player.just_teleported {
        return;
    }

    let spawn = s.world.transition(door.target, &door);
    s.player.teleport_to(spawn);
    s.player.just_teleported = true;
    let name = s.world.current_room().name;
    s.set_message(name);
    events.push(GameEvent::RoomEntered { room: door.target, door: door.kind });
}

// ══════════════════════════════════════════════════════════════
// Totals / music
// ══════════════════════════════════════════════════════════════

fn resolve_reset(s: &mut GameSession, events: &mut Vec<GameEvent>) {
    s.save.reset();
    s.set_message("Catch totals reset");
    events.push(GameEvent::TotalsReset);
}

fn resolve_music(s: &mut GameSession, now_ms: u64, events: &mut Vec<GameEvent>) {
    if let Some(track) = s.ambience.update(now_ms, s.world.current_room(), s.player.cell) {
        events.push(GameEvent::MusicCue { track });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::creature::CreatureManager;
    use crate::domain::dialogue::DialogueState;
    use crate::domain::grid::GridCell;
    use crate::domain::room::{DoorKind, RoomId};
    use crate::domain::species::{PerSpecies, Species};
    use crate::sim::save::{self, SaveStore};
    use tempfile::TempDir;

    /// Session with no roaming creatures and music off.
    fn session() -> (GameSession, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = GameConfig::default();
        cfg.population = PerSpecies::default();
        cfg.timing.music_delay_ms = u64::MAX;
        let store = SaveStore::open(dir.path().join("save_data.dat"));
        let mut s = GameSession::new(&cfg, store, CreatureManager::with_seed(9));
        s.populate();
        (s, dir)
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn interact() -> FrameInput {
        FrameInput { interact: true, ..FrameInput::default() }
    }

    fn catch() -> FrameInput {
        FrameInput { catch: true, ..FrameInput::default() }
    }

    fn walk(dir: Direction) -> FrameInput {
        FrameInput { direction: Some(dir), ..FrameInput::default() }
    }

    /// Stand just left of TA Navid (12,10).
    fn beside_navid(s: &mut GameSession) {
        s.player.teleport_to(GridCell::new(11, 10));
    }

    fn close_dialogue(s: &mut GameSession, now: u64) {
        step(s, interact(), now);
        step(s, interact(), now);
        assert_eq!(s.dialogue.state(), DialogueState::Inactive);
    }

    #[test]
    fn first_talk_starts_quest_and_freezes() {
        let (mut s, _dir) = session();
        beside_navid(&mut s);

        let ev = step(&mut s, interact(), 0);
        assert!(ev.contains(&GameEvent::QuestStarted { npc: "TA Navid" }));
        assert!(ev.contains(&GameEvent::DialogueOpened { speaker: "TA Navid" }));
        assert_eq!(s.mode(), Mode::DialogueFrozen);
        assert_eq!(s.dialogue.speaker(), "TA Navid");
        assert_eq!(s.quests.get_by_npc("TA Navid").unwrap().species, Species::Raccoon);

        // frozen: walking does nothing
        step(&mut s, walk(Direction::Left), 1000);
        assert!(!s.player.moving);
        assert_eq!(s.player.cell, GridCell::new(11, 10));
    }

    #[test]
    fn typewriter_advances_only_while_frozen() {
        let (mut s, _dir) = session();
        beside_navid(&mut s);
        step(&mut s, interact(), 0);
        step(&mut s, idle(), 36);
        step(&mut s, idle(), 72);
        assert_eq!(s.dialogue.revealed_len(), 2);
        step(&mut s, interact(), 80);
        assert_eq!(s.dialogue.state(), DialogueState::WaitingClose);
        step(&mut s, interact(), 90);
        assert_eq!(s.mode(), Mode::Normal);
    }

    #[test]
    fn quest_progress_completion_and_turn_in() {
        let (mut s, _dir) = session();
        beside_navid(&mut s);
        step(&mut s, interact(), 0);
        close_dialogue(&mut s, 10);

        // talking mid-quest replays the progress line, quest untouched
        step(&mut s, interact(), 20);
        assert!(s.dialogue.is_active());
        assert_eq!(s.quests.active().count(), 1);
        close_dialogue(&mut s, 30);

        let mut completed = vec![];
        for i in 0..3 {
            s.creatures.place(Species::Raccoon, RoomId::MainHall, GridCell::new(11, 9));
            completed.extend(step(&mut s, catch(), 100 + i));
        }
        assert!(completed.contains(&GameEvent::QuestCompleted { npc: "TA Navid".into() }));
        assert!(s.quests.get_by_npc("TA Navid").unwrap().is_completed);
        assert_eq!(save::load(s.save.path()).unwrap().counts[Species::Raccoon], 3);

        let ev = step(&mut s, interact(), 200);
        assert!(ev.contains(&GameEvent::QuestTurnedIn { npc: "TA Navid" }));
        assert!(s.quests.get_by_npc("TA Navid").is_none());
    }

    #[test]
    fn full_pool_gets_busy_line() {
        let (mut s, _dir) = session();
        s.quests.start("a", Species::Bear, 1).unwrap();
        s.quests.start("b", Species::Bear, 1).unwrap();
        s.quests.start("c", Species::Bear, 1).unwrap();
        beside_navid(&mut s);

        let ev = step(&mut s, interact(), 0);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::QuestStarted { .. })));
        s.dialogue.handle_confirm();
        assert_eq!(s.dialogue.revealed_text(), BUSY_LINE);
    }

    #[test]
    fn interact_skips_rest_of_frame() {
        let (mut s, _dir) = session();
        beside_navid(&mut s);
        s.creatures.place(Species::Deer, RoomId::MainHall, GridCell::new(11, 9));
        let ev = step(&mut s, FrameInput { interact: true, catch: true, ..FrameInput::default() }, 0);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::CreatureCaught { .. })));
        assert_eq!(s.creatures.active_counts().total(), 1);
    }

    #[test]
    fn catch_persists_and_respawns_to_target() {
        let (mut s, _dir) = session();
        s.targets = PerSpecies([1, 0, 0, 0]);
        s.player.teleport_to(GridCell::new(5, 10));
        let id = s.creatures.place(Species::Bear, RoomId::MainHall, GridCell::new(6, 10)).unwrap();

        let ev = step(&mut s, catch(), 0);
        assert_eq!(ev, vec![GameEvent::CreatureCaught { species: Species::Bear }]);
        assert_eq!(s.save.state.counts.0, [1, 0, 0, 0]);
        assert_eq!(s.creatures.active_counts().0, [1, 0, 0, 0]);
        // the caught slot was recycled
        assert_eq!(s.creatures.creatures().len(), 1);
        assert!(!s.creatures.get(id).unwrap().caught);

        // nothing adjacent any more (unless the respawn landed right here)
        if s.creatures.adjacent_to(s.player.cell, RoomId::MainHall).is_none() {
            assert!(step(&mut s, catch(), 10).is_empty());
            assert_eq!(s.message, "Nothing to catch here");
        }
    }

    #[test]
    fn door_moves_player_once() {
        let (mut s, _dir) = session();
        // Main Hall stairs down at (10,12)
        s.player.teleport_to(GridCell::new(10, 11));

        let mut entered = vec![];
        let mut now = 1000;
        for _ in 0..12 {
            entered.extend(step(&mut s, walk(Direction::Down), now));
            now += 33;
            if s.world.current_room_id() == RoomId::Basement {
                break;
            }
        }
        assert!(entered.contains(&GameEvent::RoomEntered { room: RoomId::Basement, door: DoorKind::StairsDown }));
        assert_eq!(s.player.cell, GridCell::new(15, 3));
        assert!(s.player.just_teleported);

        // spawn cell is not a door, so the guard drops on the next frame
        step(&mut s, idle(), now);
        assert!(!s.player.just_teleported);
        assert_eq!(s.world.current_room_id(), RoomId::Basement);
    }

    #[test]
    fn walking_straight_back_returns_through_door() {
        let (mut s, _dir) = session();
        s.player.teleport_to(GridCell::new(10, 11));

        let mut now = 1000;
        for _ in 0..12 {
            step(&mut s, walk(Direction::Down), now);
            now += 33;
            if s.world.current_room_id() == RoomId::Basement {
                break;
            }
        }
        assert_eq!(s.player.cell, GridCell::new(15, 3));

        // Stairs up at (15,2): step on without idling first
        let mut entered = vec![];
        for _ in 0..20 {
            entered.extend(step(&mut s, walk(Direction::Up), now));
            now += 33;
            if s.world.current_room_id() == RoomId::MainHall {
                break;
            }
        }
        assert!(entered.contains(&GameEvent::RoomEntered { room: RoomId::MainHall, door: DoorKind::StairsUp }));
        assert_eq!(s.player.cell, GridCell::new(10, 11));
        assert!(s.player.just_teleported);
    }

    #[test]
    fn frozen_frame_blocks_doors() {
        let (mut s, _dir) = session();
        s.player.teleport_to(GridCell::new(10, 12));
        s.dialogue.start("x", "hello", "", 0);
        step(&mut s, idle(), 10);
        assert_eq!(s.world.current_room_id(), RoomId::MainHall);
    }

    #[test]
    fn reset_zeroes_totals() {
        let (mut s, _dir) = session();
        s.save.record_catch(Species::Deer);
        let ev = step(&mut s, FrameInput { reset: true, ..FrameInput::default() }, 0);
        assert!(ev.contains(&GameEvent::TotalsReset));
        assert_eq!(save::load(s.save.path()).unwrap().counts.total(), 0);
    }

    #[test]
    fn music_starts_after_delay() {
        let (mut s, _dir) = session();
        s.ambience = crate::sim::ambience::Ambience::new(12_000);
        assert!(step(&mut s, idle(), 11_000).is_empty());
        let ev = step(&mut s, idle(), 12_000);
        assert_eq!(ev, vec![GameEvent::MusicCue { track: "assets/music/main_hall.ogg" }]);
    }
}
