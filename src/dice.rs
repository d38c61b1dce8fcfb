use std::time::{Duration, Instant};

use rand::Rng;

pub const OVERLAY_VISIBLE_FOR: Duration = Duration::from_millis(4000);
pub const OVERLAY_HIDE_TRANSITION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollResult {
    pub die: u32,
    pub bonus: i32,
    pub label: String,
    pub face: u32,
    /// Wide enough for any face plus any bonus.
    pub total: i64,
}

impl RollResult {
    /// `"Strength: 17 (14 + 3)"`
    pub fn message(&self) -> String {
        format!("{}: {} ({})", self.label, self.total, self.breakdown())
    }

    /// `"9 + -1"` for a negative bonus.
    pub fn breakdown(&self) -> String {
        format!("{} + {}", self.face, self.bonus)
    }

    pub fn is_natural_max(&self) -> bool {
        self.die > 1 && self.face == self.die
    }

    pub fn is_natural_one(&self) -> bool {
        self.die > 1 && self.face == 1
    }
}

pub fn roll_dice<R: Rng>(rng: &mut R, die: u32, bonus: i32, label: &str) -> RollResult {
    let die = die.max(1);
    let face = rng.gen_range(1..=die);
    RollResult {
        die,
        bonus,
        label: label.to_string(),
        face,
        total: i64::from(face) + i64::from(bonus),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Shown,
    Hiding,
}

/// Result popup. Each overlay carries its own dismissal deadline, so replacing
/// it drops the previous roll's pending hide.
#[derive(Debug, Clone)]
pub struct DiceOverlay {
    pub result: RollResult,
    pub shown_at: Instant,
    pub phase: OverlayPhase,
}

impl DiceOverlay {
    pub fn new(result: RollResult, now: Instant) -> Self {
        Self {
            result,
            shown_at: now,
            phase: OverlayPhase::Shown,
        }
    }

    /// Advances the phase; returns `false` once the overlay should be dropped.
    pub fn tick(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.shown_at);
        if elapsed >= OVERLAY_VISIBLE_FOR + OVERLAY_HIDE_TRANSITION {
            return false;
        }
        if elapsed >= OVERLAY_VISIBLE_FOR {
            self.phase = OverlayPhase::Hiding;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn faces_stay_within_die() {
        let mut rng = StdRng::seed_from_u64(7);
        for die in [2u32, 4, 6, 8, 10, 12, 20, 100] {
            for _ in 0..500 {
                let r = roll_dice(&mut rng, die, -2, "t");
                assert!((1..=die).contains(&r.face));
                assert_eq!(r.total, i64::from(r.face) - 2);
            }
        }
    }

    #[test]
    fn d1_always_rolls_one() {
        let mut rng = StdRng::seed_from_u64(1);
        for bonus in [-3, 0, 5] {
            let r = roll_dice(&mut rng, 1, bonus, "flat");
            assert_eq!(r.face, 1);
            assert_eq!(r.total, 1 + i64::from(bonus));
        }
    }

    #[test]
    fn zero_sided_die_is_treated_as_d1() {
        let mut rng = StdRng::seed_from_u64(3);
        let r = roll_dice(&mut rng, 0, 2, "odd");
        assert_eq!(r.die, 1);
        assert_eq!(r.face, 1);
        assert_eq!(r.total, 3);
    }

    #[test]
    fn message_shows_label_total_and_breakdown() {
        let r = RollResult {
            die: 20,
            bonus: 3,
            label: "Strength".to_string(),
            face: 14,
            total: 17,
        };
        assert_eq!(r.message(), "Strength: 17 (14 + 3)");

        let r = RollResult {
            die: 20,
            bonus: -1,
            label: "Intelligence".to_string(),
            face: 9,
            total: 8,
        };
        assert_eq!(r.message(), "Intelligence: 8 (9 + -1)");
    }

    #[test]
    fn extreme_bonus_and_die_keep_exact_total() {
        let mut rng = StdRng::seed_from_u64(11);
        let r = roll_dice(&mut rng, 20, i32::MAX, "Big");
        assert_eq!(r.total, i64::from(r.face) + i64::from(i32::MAX));

        let r = roll_dice(&mut rng, u32::MAX, i32::MIN, "Huge");
        assert_eq!(r.total, i64::from(r.face) + i64::from(i32::MIN));
    }

    #[test]
    fn overlay_hides_then_expires() {
        let t0 = Instant::now();
        let mut overlay = DiceOverlay::new(
            RollResult {
                die: 20,
                bonus: 0,
                label: "x".to_string(),
                face: 10,
                total: 10,
            },
            t0,
        );
        assert!(overlay.tick(t0 + Duration::from_millis(3999)));
        assert_eq!(overlay.phase, OverlayPhase::Shown);
        assert!(overlay.tick(t0 + Duration::from_millis(4000)));
        assert_eq!(overlay.phase, OverlayPhase::Hiding);
        assert!(!overlay.tick(t0 + Duration::from_millis(4500)));
    }
}
