//! Simulated visitor activity after navigation.
//!
//! Some tag managers only inject their payload on user activity, and some bot
//! checks wait for it. Events are dispatched from page script so the
//! simulation does not depend on input-domain CDP support.

use std::time::Duration;

use chromiumoxide::Page;
use log::trace;
use rand::Rng;

/// One scripted step.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum InteractionStep {
    PointerMove { x: u32, y: u32 },
    Scroll { delta_y: u32 },
    Idle { millis: u64 },
}

impl InteractionStep {
    fn script(&self) -> Option<String> {
        match self {
            InteractionStep::PointerMove { x, y } => Some(format!(
                "document.dispatchEvent(new MouseEvent('mousemove', \
                 {{clientX: {x}, clientY: {y}, bubbles: true}})); true"
            )),
            InteractionStep::Scroll { delta_y } => {
                Some(format!("window.scrollBy(0, {delta_y}); true"))
            }
            InteractionStep::Idle { .. } => None,
        }
    }
}

/// A short random sequence of pointer moves, incremental scrolls and pauses
/// inside a `width` x `height` viewport.
pub(crate) fn plan(width: u32, height: u32) -> Vec<InteractionStep> {
    let mut rng = rand::rng();
    let mut steps = Vec::new();

    for _ in 0..rng.random_range(3..6) {
        steps.push(InteractionStep::PointerMove {
            x: rng.random_range(0..width.max(1)),
            y: rng.random_range(0..height.max(1)),
        });
        steps.push(InteractionStep::Idle {
            millis: rng.random_range(50..200),
        });
    }
    for _ in 0..rng.random_range(2..5) {
        steps.push(InteractionStep::Scroll {
            delta_y: rng.random_range(200..600),
        });
        steps.push(InteractionStep::Idle {
            millis: rng.random_range(150..400),
        });
    }
    steps
}

/// Plays `steps` on the page. Individual failures are ignored.
pub(crate) async fn simulate(page: &Page, steps: &[InteractionStep]) {
    for step in steps {
        match step.script() {
            Some(script) => {
                if let Err(e) = page.evaluate(script).await {
                    trace!("Interaction step {step:?} failed: {e}");
                }
            }
            None => {
                if let InteractionStep::Idle { millis } = step {
                    tokio::time::sleep(Duration::from_millis(*millis)).await;
                }
            }
        }
    }
}
