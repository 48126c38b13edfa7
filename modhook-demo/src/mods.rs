// Sample mods for the demo host
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use modhook_core::{EventParam, EventParams, Listener};
use modhook_runtime::{CallHook, HookedCall};

pub const TAKE_DAMAGE: &str = "Player::TakeDamage";

pub type DamageSlots = (EventParam<u32>, EventParam<i32>);
pub type DamageParams = EventParams<DamageSlots>;
pub type DamageCall = HookedCall<(u32, i32), u32>;
pub type DamageHook = CallHook<DamageSlots, u32>;

/// The hooked game function.
pub fn take_damage((health, amount): (u32, i32)) -> u32 {
    health.saturating_sub(amount.max(0) as u32)
}

pub fn damage_params(health: u32, amount: i32) -> DamageParams {
    EventParams::new((EventParam::numeric(health), EventParam::numeric(amount)))
}

/// Halves incoming damage.
pub mod armor {
    use super::*;

    pub const NAME: &str = "armor";

    pub fn init(hook: &DamageHook) -> Listener<DamageParams> {
        let listener = Listener::by_value(|params: DamageParams| {
            let mut amount = params.arg2().clone();
            amount /= 2;
        });
        if !hook.before().add_listener(listener.clone()) {
            log::warn!("{}: listener not registered", NAME);
        }
        listener
    }
}

/// Logs every hit after it lands.
pub mod damage_log {
    use super::*;

    pub const NAME: &str = "damage_log";

    pub fn init(hook: &DamageHook) -> Arc<AtomicU32> {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let listener = Listener::by_value(move |call: DamageCall| {
            let (health, amount) = call.args;
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            log::info!(
                "{}: hit #{} for {} ({} -> {})",
                NAME,
                n,
                amount,
                health,
                call.result
            );
        });
        if !hook.after().add_listener(listener) {
            log::warn!("{}: listener not registered", NAME);
        }
        hits
    }
}

/// Keeps the player at 1 health instead of 0.
pub mod last_stand {
    use super::*;

    pub const NAME: &str = "last_stand";

    pub fn init(hook: &DamageHook) {
        let listener = Listener::by_ref(|call: &mut DamageCall| {
            if call.result == 0 && call.args.0 > 1 {
                log::info!("{}: saved the player", NAME);
                call.result = 1;
            }
        });
        if !hook.after().add_listener(listener) {
            log::warn!("{}: listener not registered", NAME);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_damage_clamps() {
        assert_eq!(take_damage((10, 4)), 6);
        assert_eq!(take_damage((10, 40)), 0);
        assert_eq!(take_damage((10, -5)), 10);
    }
}
