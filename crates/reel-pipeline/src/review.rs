//! Interactive timeline review.

use dialoguer::Confirm;

use reel_compositor::{
    AutoAccept, CompositorError, CompositorResult, Decision, ReviewDecider, TimelineStats,
};

/// Prints the timeline summary and asks the operator to accept it.
#[derive(Debug, Default)]
pub struct ConsoleDecider;

impl ReviewDecider for ConsoleDecider {
    fn decide(&mut self, stats: &TimelineStats, attempt: usize) -> CompositorResult<Decision> {
        println!("\nTimeline #{}\n{}", attempt, stats.render());

        let accepted = Confirm::new()
            .with_prompt("Render this timeline? (no regenerates it)")
            .default(true)
            .interact()
            .map_err(|e| CompositorError::review_aborted(e.to_string()))?;

        Ok(if accepted {
            Decision::Accept
        } else {
            Decision::Regenerate
        })
    }
}

/// `--yes` skips the prompt.
pub fn decider_for(auto_accept: bool) -> Box<dyn ReviewDecider + Send> {
    if auto_accept {
        Box::new(AutoAccept)
    } else {
        Box::new(ConsoleDecider)
    }
}
