//! Objective State Machine (spec §4.2): dispatch over the nine states,
//! each handled by a free function in [`temple`] or [`boss`] that returns a
//! [`Transition`].
//!
//! Grounded on the teacher's `signal_processor::combat_state` match-on-enum
//! dispatch to `handle_x()` helpers, generalized from combat log line
//! classification to tick-driven objective progression.

pub mod boss;
pub mod temple;

use std::time::Instant;

use mapper_types::MapperSettings;

use crate::error::RecoveryEvent;
use crate::intent::Intent;
use crate::mapper::Mapper;
use crate::state::State;
use crate::world::{AreaInfo, GridPos, WorldApi};

/// What a state handler decided this tick.
#[derive(Default)]
pub struct Transition {
    pub next_state: Option<State>,
    pub intents: Vec<Intent>,
    pub recoveries: Vec<RecoveryEvent>,
    /// Re-dispatch within the same tick (e.g. IDLE's unconditional
    /// transition into FIND_TEMPLE, or FIND_TEMPLE's immediate hand-off
    /// into WALK_TEMPLE once a target is known).
    pub continue_tick: bool,
}

impl Transition {
    pub fn stay(intents: Vec<Intent>) -> Self {
        Self { intents, ..Default::default() }
    }

    pub fn go(next: State) -> Self {
        Self { next_state: Some(next), continue_tick: true, ..Default::default() }
    }

    pub fn go_with(next: State, intents: Vec<Intent>) -> Self {
        Self { next_state: Some(next), intents, ..Default::default() }
    }

    pub fn recovery(mut self, event: RecoveryEvent) -> Self {
        self.recoveries.push(event);
        self
    }
}

const MAX_IMMEDIATE_TRANSITIONS: u32 = 8;

/// Run the state machine forward by one tick, looping while handlers
/// request an immediate re-dispatch (spec S1: IDLE -> FIND_TEMPLE ->
/// WALK_TEMPLE can all settle within a single tick).
pub fn dispatch(
    mapper: &mut Mapper,
    world: &dyn WorldApi,
    settings: &MapperSettings,
    now: Instant,
    player: GridPos,
    area: &AreaInfo,
) -> Vec<Intent> {
    let mut all_intents = Vec::new();
    let mut guard = 0;

    loop {
        guard += 1;
        let from_state = mapper.state;
        let transition = match mapper.state {
            State::Idle => temple::handle_idle(),
            State::FindTemple => temple::handle_find_temple(mapper, world, now),
            State::WalkTemple => temple::handle_walk_temple(mapper, world, settings, now, player),
            State::ClearTemple => temple::handle_clear_temple(mapper, world, settings, now, player),
            State::FindBoss => boss::handle_find_boss(mapper, world, settings, now, player),
            State::WalkBossCheckpoint => boss::handle_walk_boss_checkpoint(mapper, world, settings, now, player),
            State::WalkBossMelee => boss::handle_walk_boss_melee(mapper, world, settings, now, player),
            State::FightBoss => boss::handle_fight_boss(mapper, world, settings, now, player, area),
            State::Complete => boss::handle_complete(mapper, settings, now),
        };

        for event in &transition.recoveries {
            mapper.log.emit(now, event.to_string());
        }
        all_intents.extend(transition.intents);

        if let Some(next_state) = transition.next_state {
            on_transition(mapper, from_state, next_state, now);
            mapper.state = next_state;
        }

        if !transition.continue_tick || guard >= MAX_IMMEDIATE_TRANSITIONS {
            break;
        }
    }

    all_intents
}

/// Transition invariants (spec §4.2): leaving any state cancels its path
/// commit; entering FIGHT_BOSS resets orbit state with a random direction.
fn on_transition(mapper: &mut Mapper, from: State, to: State, now: Instant) {
    if from != to {
        mapper.path.clear();
    }
    if to == State::FightBoss {
        use rand::Rng;
        let direction: i8 = if rand::thread_rng().gen_bool(0.5) { 1 } else { -1 };
        mapper.orbit.reset_for_fight(now, direction);
    }
    if to == State::FindTemple || to == State::FindBoss {
        mapper.boss.checkpoint_commit_at = None;
        mapper.boss.checkpoint_best_distance = None;
        mapper.boss.checkpoint_best_distance_at = None;
    }
}
