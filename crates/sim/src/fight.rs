//! Scripted fight played against the template's first boss.

use std::time::Duration;

use anyhow::Result;
use encounter::EncounterState;
use runtime::{ActorId, HookEvent, InstanceTemplate, SimulationHandle};
use tracing::info;

const RAID_LEADER: ActorId = ActorId(1);

/// Health checkpoints reported to the boss, with the fight time before each.
const DAMAGE_STEPS: [(u64, u8); 3] = [(3_000, 80), (4_000, 60), (6_000, 35)];

pub async fn play(handle: &SimulationHandle, template: &InstanceTemplate) -> Result<()> {
    let Some((boss, slot)) = template
        .spawns
        .iter()
        .find_map(|spawn| spawn.slot.map(|slot| (spawn.actor, slot)))
    else {
        info!("Template has no boss spawn, nothing to fight");
        return Ok(());
    };

    let state = handle
        .snapshot()
        .await?
        .instance
        .and_then(|instance| instance.states.get(slot).copied());
    if state != Some(EncounterState::NotStarted) {
        info!("Boss slot {} is {:?}, skipping the fight", slot, state);
        return Ok(());
    }

    info!("Pulling {}", boss);
    handle
        .notify(boss, HookEvent::EnterCombat { target: RAID_LEADER })
        .await?;

    for (wait_ms, health_pct) in DAMAGE_STEPS {
        tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        handle
            .notify(
                boss,
                HookEvent::Damaged {
                    attacker: Some(RAID_LEADER),
                    amount: 50_000,
                    health_pct,
                },
            )
            .await?;
    }

    tokio::time::sleep(Duration::from_secs(3)).await;
    handle
        .notify(boss, HookEvent::Death { killer: Some(RAID_LEADER) })
        .await?;
    info!("{} defeated", boss);

    Ok(())
}
