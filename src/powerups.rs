use crate::components::PowerUpKind;
use crate::config::GameConfig;
use crate::ghost::Enemy;
use crate::player::Player;

/// Fans power-up activations out to the agents they affect and remembers
/// which kinds are currently in play.
#[derive(Clone, Debug, Default)]
pub struct PowerUpCoordinator {
    active: Vec<PowerUpKind>,
}

impl PowerUpCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(
        &mut self,
        kind: PowerUpKind,
        player: &mut Player,
        enemies: &mut [Enemy],
        config: &GameConfig,
    ) {
        let ticks = config.power_up_ticks(kind);
        match kind {
            PowerUpKind::GhostVulnerability => {
                player.activate_power_up(kind, ticks);
                for enemy in enemies.iter_mut() {
                    enemy.make_vulnerable(ticks);
                }
            }
            PowerUpKind::SpeedBoost | PowerUpKind::Shield => {
                player.activate_power_up(kind, ticks);
            }
            PowerUpKind::BonusFruit => {}
        }
        if !self.active.contains(&kind) {
            self.active.push(kind);
        }
        tracing::debug!(?kind, ticks, "power-up activated");
    }

    pub fn clear_all(&mut self, player: &mut Player, enemies: &mut [Enemy]) {
        player.clear_power_ups();
        for enemy in enemies.iter_mut() {
            enemy.clear_vulnerability();
        }
        self.active.clear();
    }

    pub fn active_kinds(&self) -> &[PowerUpKind] {
        &self.active
    }

    pub fn is_active(&self, kind: PowerUpKind, player: &Player) -> bool {
        self.active.contains(&kind)
            && (kind == PowerUpKind::BonusFruit || player.has_power_up(kind))
    }

    /// Forgets kinds whose player-side effect has run out. `BonusFruit` has
    /// no such effect and stays listed until the next clear.
    pub fn prune(&mut self, player: &Player) {
        self.active
            .retain(|kind| *kind == PowerUpKind::BonusFruit || player.has_power_up(*kind));
    }
}
