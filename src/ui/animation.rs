//! Scroll animation driver
//!
//! A `ScrollTween` knows nothing about time: whoever owns it calls
//! `advance()` once per frame. The app drives it from a timer
//! subscription, tests call it directly.

/// Result of advancing a tween by one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenStep {
    /// Intermediate offset, more steps follow
    Moving(f32),
    /// Final offset, the tween is done
    Finished(f32),
}

/// Linear interpolation between two offsets over a fixed number of steps
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTween {
    from: f32,
    to: f32,
    steps: u32,
    step: u32,
}

impl ScrollTween {
    pub fn new(from: f32, to: f32, steps: u32) -> Self {
        Self {
            from,
            to,
            steps: steps.max(1),
            step: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.steps
    }

    /// Offset reached after the steps taken so far
    pub fn current(&self) -> f32 {
        if self.is_finished() {
            return self.to;
        }
        self.from + (self.to - self.from) * self.step as f32 / self.steps as f32
    }

    pub fn advance(&mut self) -> TweenStep {
        if self.step < self.steps {
            self.step += 1;
        }
        if self.is_finished() {
            TweenStep::Finished(self.to)
        } else {
            TweenStep::Moving(self.current())
        }
    }
}

/// Vertical offset that brings `row` into view.
///
/// The target row sits one and a half rows below the top edge; the first
/// row never scrolls.
pub fn row_offset(row: usize, row_height: f32) -> f32 {
    if row < 2 {
        0.0
    } else {
        row_height * (row as f32 - 1.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tween_reaches_target_in_steps() {
        let mut tween = ScrollTween::new(0.0, 600.0, 6);
        let mut offsets = Vec::new();
        loop {
            match tween.advance() {
                TweenStep::Moving(offset) => offsets.push(offset),
                TweenStep::Finished(offset) => {
                    offsets.push(offset);
                    break;
                }
            }
        }
        assert_eq!(offsets, vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0]);
        assert!(tween.is_finished());
    }

    #[test]
    fn test_tween_scrolls_backwards() {
        let mut tween = ScrollTween::new(300.0, 0.0, 3);
        assert_eq!(tween.advance(), TweenStep::Moving(200.0));
        assert_eq!(tween.current(), 200.0);
        assert_eq!(tween.advance(), TweenStep::Moving(100.0));
        assert_eq!(tween.advance(), TweenStep::Finished(0.0));
        // Further frames keep reporting the target
        assert_eq!(tween.advance(), TweenStep::Finished(0.0));
    }

    #[test]
    fn test_zero_steps_finishes_immediately() {
        let mut tween = ScrollTween::new(10.0, 20.0, 0);
        assert_eq!(tween.advance(), TweenStep::Finished(20.0));
    }

    #[test]
    fn test_row_offset() {
        assert_eq!(row_offset(0, 224.0), 0.0);
        assert_eq!(row_offset(1, 224.0), 0.0);
        assert_eq!(row_offset(2, 224.0), 112.0);
        assert_eq!(row_offset(9, 224.0), 224.0 * 7.5);
    }
}
