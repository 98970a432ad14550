//! Outbound intents. `Mapper::tick` is a pure-ish function of `(&mut Mapper,
//! &dyn WorldApi) -> Vec<Intent>`; the host (or a thin adapter over
//! [`crate::world::PacketSink`]) is responsible for actually sending them.
//! Rate limiting happens inside the CORE before an intent is produced, not
//! after, so the host never has to throttle on its own.

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// `move_at_angle(screen_angle_deg, distance_units)`.
    Move { screen_angle_deg: f32, distance_units: f32 },
    /// `stop_movement()`.
    Stop,
    /// `execute_channeled_skill(skill_bytes, dx, dy, slot)` — used only for
    /// the behind-dodge burst and the emergency roll-out.
    ChanneledSkill { skill_bytes: Vec<u8>, dx: f32, dy: f32, slot: u8 },
}

/// Dispatch a batch of intents through a [`crate::world::PacketSink`].
pub fn dispatch(intents: &[Intent], sink: &mut dyn crate::world::PacketSink) {
    for intent in intents {
        match intent {
            Intent::Move { screen_angle_deg, distance_units } => {
                sink.move_at_angle(*screen_angle_deg, *distance_units);
            }
            Intent::Stop => {
                sink.stop_movement();
            }
            Intent::ChanneledSkill { skill_bytes, dx, dy, slot } => {
                sink.execute_channeled_skill(skill_bytes, *dx, *dy, *slot);
            }
        }
    }
}
