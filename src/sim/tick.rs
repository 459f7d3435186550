//! Fixed timestep simulation tick
//!
//! Core game loop that advances the match one frame: intents, movement,
//! shells, hits, then the clock.

use std::collections::BTreeMap;

use super::ai::Opponent;
use super::collision::{ShellStep, shell_hits_tank, step_projectile};
use super::state::{ControlSource, GameEvent, Intent, MatchPhase, MatchState, TankId, TickSnapshot};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Control flags for human-driven tanks, keyed in table order
    pub intents: BTreeMap<TankId, Intent>,
}

impl TickInput {
    pub fn with(mut self, tank: TankId, intent: Intent) -> Self {
        self.intents.insert(tank, intent);
        self
    }
}

/// Advance the match by one fixed timestep and report what happened
pub fn tick(state: &mut MatchState, input: &TickInput) -> TickSnapshot {
    // Nothing moves outside of play
    if state.phase != MatchPhase::Playing {
        return state.snapshot(Vec::new());
    }

    let mut events = Vec::new();

    for id in input.intents.keys() {
        match state.tank(*id) {
            None => log::warn!("Ignoring intent for unknown tank {:?}", id),
            Some(tank) if tank.control.is_ai() => {
                log::warn!("Ignoring intent for AI-controlled tank {:?}", id)
            }
            Some(_) => {}
        }
    }

    drive_tanks(state, input, &mut events);
    advance_projectiles(state);
    resolve_hits(state, &mut events);

    state.time_ticks += 1;
    if state.time_ticks >= state.end_tick {
        state.phase = MatchPhase::Ended;
        let winner = state.winner();
        log::info!(
            "Match ended after {:.1}s: winner={:?} scores={:?}",
            state.elapsed_secs(),
            winner,
            state
                .tanks
                .iter()
                .map(|t| (t.kills, t.deaths, t.suicides))
                .collect::<Vec<_>>()
        );
        events.push(GameEvent::MatchEnded { winner });
    }

    state.snapshot(events)
}

/// Resolve and apply every tank's intent, in table order
fn drive_tanks(state: &mut MatchState, input: &TickInput, events: &mut Vec<GameEvent>) {
    for i in 0..state.tanks.len() {
        // First other living tank is the AI's opponent
        let opponent = state
            .tanks
            .iter()
            .enumerate()
            .find(|(j, t)| *j != i && t.alive)
            .map(|(_, t)| Opponent { id: t.id, pos: t.pos });

        let tank = &mut state.tanks[i];
        if !tank.alive {
            continue;
        }
        tank.cooldown = tank.cooldown.saturating_sub(1);

        let (pos, heading) = (tank.pos, tank.heading);
        let intent = match &mut tank.control {
            ControlSource::Ai(brain) => brain.decide(pos, heading, opponent, &state.arena, &mut state.rng),
            ControlSource::Human => input.intents.get(&tank.id).copied().unwrap_or_default(),
        };

        if tank.apply_intent(&intent, &state.arena) {
            events.push(GameEvent::Fired { tank: tank.id });
        }
    }
}

/// Move every shell and drop the ones that expired
fn advance_projectiles(state: &mut MatchState) {
    for tank in &mut state.tanks {
        for shell in &mut tank.projectiles {
            if step_projectile(shell, &state.arena) == ShellStep::Expired {
                log::trace!("Shell from {:?} expired after {} bounces", shell.owner, shell.bounces);
            }
        }
        tank.projectiles.retain(|p| p.active);
    }
}

/// Check every shell against every living tank, own shells included
fn resolve_hits(state: &mut MatchState, events: &mut Vec<GameEvent>) {
    let tanks = &mut state.tanks;
    for victim in 0..tanks.len() {
        for owner in 0..tanks.len() {
            let mut shell = 0;
            while shell < tanks[owner].projectiles.len() {
                if !shell_hits_tank(&tanks[owner].projectiles[shell], &tanks[victim]) {
                    shell += 1;
                    continue;
                }
                tanks[owner].projectiles[shell].active = false;

                let suicide = owner == victim;
                if suicide {
                    tanks[victim].suicides += 1;
                } else {
                    tanks[owner].kills += 1;
                }
                tanks[victim].deaths += 1;
                tanks[victim].respawn();

                let (victim_id, attacker_id) = (tanks[victim].id, tanks[owner].id);
                log::debug!(
                    "{:?} hit by {:?}{}; respawned",
                    victim_id,
                    attacker_id,
                    if suicide { " (suicide)" } else { "" }
                );
                events.push(GameEvent::Hit {
                    victim: victim_id,
                    attacker: attacker_id,
                    suicide,
                });
                events.push(GameEvent::Respawned { tank: victim_id });
                shell += 1;
            }
        }
    }

    for tank in tanks.iter_mut() {
        tank.projectiles.retain(|p| p.active);
    }
}
