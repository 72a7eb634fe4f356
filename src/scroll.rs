/// Damping divisor applied to the remaining gap each frame.
pub const SCROLL_SPEED: f32 = 10.0;
/// Pixels of target displacement per wheel notch.
pub const SCROLL_STEP: f32 = 30.0;

/// A damped scroll offset pair for one scrollable region.
///
/// Offsets live in `[min_offset, 0]`: 0 means the content top is flush with
/// the viewport top, negative values scroll downward. `current` chases
/// `target` with a proportional step and no velocity term.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollPair {
    pub current: f32,
    pub target: f32,
}

impl ScrollPair {
    /// Displaces the target by one fixed step per wheel notch, signed by
    /// wheel direction.
    pub fn wheel(&mut self, direction: f32) {
        if direction != 0.0 {
            self.target += direction.signum() * SCROLL_STEP;
        }
    }

    /// One frame of damped approach. Snaps once the residual gap falls
    /// under a pixel so the offset settles instead of asymptoting.
    pub fn step(&mut self) {
        let gap = self.target - self.current;
        if gap.abs() < 1.0 {
            self.current = self.target;
        } else {
            self.current += gap / SCROLL_SPEED;
        }
    }

    /// Clamps both values into `[min_offset, 0]` for the given content and
    /// viewport heights. Content that fits entirely pins both to 0.
    pub fn clamp(&mut self, content_height: f32, visible_height: f32) {
        let min_offset = -(content_height - visible_height).max(0.0);
        self.current = self.current.clamp(min_offset, 0.0);
        self.target = self.target.clamp(min_offset, 0.0);
    }

    /// Sends the target to the bottom of the content.
    pub fn to_end(&mut self, content_height: f32, visible_height: f32) {
        self.target = -(content_height - visible_height).max(0.0);
    }

    pub fn reset(&mut self) {
        self.current = 0.0;
        self.target = 0.0;
    }

    /// The positive offset convention used by the scroll viewport.
    pub fn view_offset(&self) -> f32 {
        -self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_converges_to_target_without_overshoot() {
        let mut scroll = ScrollPair {
            current: 0.0,
            target: -200.0,
        };

        let mut previous = scroll.current;
        for _ in 0..200 {
            scroll.step();
            assert!(scroll.current <= previous, "offset moved away from target");
            assert!(scroll.current >= scroll.target, "offset overshot target");
            previous = scroll.current;
        }

        assert_eq!(scroll.current, -200.0);
    }

    #[test]
    fn step_snaps_when_the_gap_is_under_a_pixel() {
        let mut scroll = ScrollPair {
            current: -99.5,
            target: -100.0,
        };

        scroll.step();

        assert_eq!(scroll.current, -100.0);
    }

    #[test]
    fn wheel_moves_target_by_a_fixed_signed_step() {
        let mut scroll = ScrollPair::default();

        scroll.wheel(-1.0);
        assert_eq!(scroll.target, -SCROLL_STEP);

        scroll.wheel(-3.5);
        assert_eq!(scroll.target, -2.0 * SCROLL_STEP);

        scroll.wheel(1.0);
        assert_eq!(scroll.target, -SCROLL_STEP);

        scroll.wheel(0.0);
        assert_eq!(scroll.target, -SCROLL_STEP);
    }

    #[test]
    fn clamp_keeps_offsets_within_bounds() {
        let mut scroll = ScrollPair {
            current: -500.0,
            target: -900.0,
        };

        scroll.clamp(600.0, 400.0);

        assert_eq!(scroll.current, -200.0);
        assert_eq!(scroll.target, -200.0);

        scroll.current = 40.0;
        scroll.target = 10.0;
        scroll.clamp(600.0, 400.0);

        assert_eq!(scroll.current, 0.0);
        assert_eq!(scroll.target, 0.0);
    }

    #[test]
    fn clamp_pins_fitting_content_to_zero() {
        let mut scroll = ScrollPair {
            current: -120.0,
            target: -80.0,
        };

        scroll.clamp(300.0, 400.0);

        assert_eq!(scroll, ScrollPair::default());
    }

    #[test]
    fn interpolation_stays_clamped_every_frame() {
        let mut scroll = ScrollPair::default();
        for _ in 0..50 {
            scroll.wheel(-1.0);
        }

        for _ in 0..100 {
            scroll.step();
            scroll.clamp(700.0, 400.0);
            assert!(scroll.current <= 0.0);
            assert!(scroll.current >= -300.0);
            assert!(scroll.target <= 0.0);
            assert!(scroll.target >= -300.0);
        }

        assert_eq!(scroll.current, -300.0);
    }

    #[test]
    fn to_end_targets_the_content_bottom() {
        let mut scroll = ScrollPair::default();

        scroll.to_end(1000.0, 400.0);
        assert_eq!(scroll.target, -600.0);

        scroll.to_end(200.0, 400.0);
        assert_eq!(scroll.target, 0.0);
    }
}
