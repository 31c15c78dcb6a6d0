use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoScrollConfig {
    /// Height of each activation band as a fraction of the viewport height.
    pub band_fraction: f32,
    /// Largest per-tick scroll step as a fraction of the viewport height, reached at the edge.
    pub max_step_fraction: f32,
    /// Interval between scroll ticks in milliseconds.
    pub tick_ms: u64,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            band_fraction: 0.1,
            max_step_fraction: 0.01,
            tick_ms: 16,
        }
    }
}

impl AutoScrollConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollIntent {
    pub direction: ScrollDirection,
    /// How far into the band the pointer sits: 0 at the band's inner edge, 1 at the container
    /// edge (and beyond it).
    pub depth: f32,
}

/// Decide whether a pointer at `pointer_y` should scroll the container whose visible area is
/// `viewport`.
pub fn evaluate(pointer_y: f32, viewport: Rect, config: &AutoScrollConfig) -> Option<ScrollIntent> {
    if viewport.is_degenerate() || !pointer_y.is_finite() {
        return None;
    }

    let height = viewport.height();
    let band = height * config.band_fraction.clamp(0.0, 0.5);
    if band <= 0.0 {
        return None;
    }

    let y = pointer_y - viewport.top();
    if y <= band {
        return Some(ScrollIntent {
            direction: ScrollDirection::Up,
            depth: ((band - y) / band).clamp(0.0, 1.0),
        });
    }
    if y >= height - band {
        return Some(ScrollIntent {
            direction: ScrollDirection::Down,
            depth: ((y - (height - band)) / band).clamp(0.0, 1.0),
        });
    }
    None
}

/// Handle for the single recurring scroll timer an [`AutoScroller`] may have running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerToken(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoScrollTransition {
    /// Outside both bands with no timer running.
    Idle,
    /// Entered a band; the caller must start a timer driving [`AutoScroller::step`] with this token.
    Start(TimerToken),
    /// Still inside a band; the running timer keeps going with the updated intent.
    Continue,
    /// Left both bands; the running timer is now stale.
    Stop,
}

#[derive(Debug, Default)]
pub struct AutoScroller {
    config: AutoScrollConfig,
    intent: Option<ScrollIntent>,
    viewport_height: f32,
    timer: Option<TimerToken>,
    next_token: u64,
}

impl AutoScroller {
    pub fn new(config: AutoScrollConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &AutoScrollConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Re-evaluate on every drag move. Starts the timer lazily and stops it as soon as the pointer
    /// leaves both bands.
    pub fn on_pointer_move(&mut self, pointer_y: f32, viewport: Rect) -> AutoScrollTransition {
        match evaluate(pointer_y, viewport, &self.config) {
            Some(intent) => {
                self.intent = Some(intent);
                self.viewport_height = viewport.height();
                if self.timer.is_some() {
                    return AutoScrollTransition::Continue;
                }
                let token = TimerToken(self.next_token);
                self.next_token = self.next_token.wrapping_add(1);
                self.timer = Some(token);
                tracing::trace!(?intent, "autoscroll started");
                AutoScrollTransition::Start(token)
            }
            None => {
                self.intent = None;
                if self.timer.take().is_some() {
                    tracing::trace!("autoscroll stopped");
                    AutoScrollTransition::Stop
                } else {
                    AutoScrollTransition::Idle
                }
            }
        }
    }

    /// Signed scroll delta for one tick (negative scrolls up), or `None` when `token` no longer
    /// belongs to the running timer.
    pub fn step(&self, token: TimerToken) -> Option<f32> {
        if self.timer != Some(token) {
            return None;
        }
        let intent = self.intent?;
        let max_step = self.viewport_height * self.config.max_step_fraction.max(0.0);
        let magnitude = max_step * intent.depth;
        Some(match intent.direction {
            ScrollDirection::Up => -magnitude,
            ScrollDirection::Down => magnitude,
        })
    }

    /// Stop scrolling unconditionally. Returns whether a timer was running.
    pub fn cancel(&mut self) -> bool {
        self.intent = None;
        self.timer.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(height: f32) -> Rect {
        Rect::new(0., 0., 400., height)
    }

    #[test]
    fn bands_cover_top_and_bottom_tenth() {
        let config = AutoScrollConfig::default();
        let vp = viewport(1000.);

        for y in [0., 50., 100.] {
            assert_eq!(
                evaluate(y, vp, &config).map(|i| i.direction),
                Some(ScrollDirection::Up),
                "y={y}"
            );
        }
        for y in [900., 950., 1000.] {
            assert_eq!(
                evaluate(y, vp, &config).map(|i| i.direction),
                Some(ScrollDirection::Down),
                "y={y}"
            );
        }
        for y in [100.5, 500., 899.5] {
            assert_eq!(evaluate(y, vp, &config), None, "y={y}");
        }
    }

    #[test]
    fn depth_ramps_towards_the_edge() {
        let config = AutoScrollConfig::default();
        let vp = Rect::new(0., 200., 400., 1000.);

        assert_eq!(evaluate(300., vp, &config).unwrap().depth, 0.0);
        assert_eq!(evaluate(250., vp, &config).unwrap().depth, 0.5);
        assert_eq!(evaluate(200., vp, &config).unwrap().depth, 1.0);
        assert_eq!(evaluate(-40., vp, &config).unwrap().depth, 1.0);
        assert_eq!(evaluate(1150., vp, &config).unwrap().depth, 0.5);
    }

    #[test]
    fn degenerate_viewport_never_scrolls() {
        let config = AutoScrollConfig::default();
        assert_eq!(evaluate(0., viewport(0.), &config), None);
        assert_eq!(evaluate(0., Rect::new(0., f32::NAN, 10., 10.), &config), None);
        assert_eq!(evaluate(f32::NAN, viewport(100.), &config), None);
    }

    #[test]
    fn at_most_one_timer_per_scroller() {
        let mut scroller = AutoScroller::new(AutoScrollConfig::default());
        let vp = viewport(1000.);

        let AutoScrollTransition::Start(token) = scroller.on_pointer_move(10., vp) else {
            panic!("expected the timer to start");
        };
        assert_eq!(scroller.on_pointer_move(5., vp), AutoScrollTransition::Continue);
        assert_eq!(scroller.on_pointer_move(990., vp), AutoScrollTransition::Continue);
        assert!(scroller.step(token).unwrap() > 0.0);

        assert_eq!(scroller.on_pointer_move(500., vp), AutoScrollTransition::Stop);
        assert_eq!(scroller.step(token), None);
        assert_eq!(scroller.on_pointer_move(500., vp), AutoScrollTransition::Idle);

        let AutoScrollTransition::Start(next) = scroller.on_pointer_move(0., vp) else {
            panic!("expected a fresh timer");
        };
        assert_ne!(next, token);
        assert_eq!(scroller.step(token), None);
        assert_eq!(scroller.step(next), Some(-10.0));

        assert!(scroller.cancel());
        assert_eq!(scroller.step(next), None);
        assert!(!scroller.cancel());
    }
}
