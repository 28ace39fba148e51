// src/loading.rs
use std::time::Duration;

pub const LOADING_MESSAGES: [&str; 7] = [
    "Adjusting the lens aperture...",
    "Calibrating the time capacitor...",
    "Applying vintage film grain...",
    "Styling 90s grunge hair...",
    "Reheating the Polaroid chemicals...",
    "Developing the negatives...",
    "Synthesizing 80s synth-pop vibes...",
];

pub const MESSAGE_INTERVAL: Duration = Duration::from_secs(2);

/// Message shown by the busy overlay after `elapsed` time in flight.
pub fn loading_message(elapsed: Duration) -> &'static str {
    let step = elapsed.as_millis() / MESSAGE_INTERVAL.as_millis();
    LOADING_MESSAGES[(step % LOADING_MESSAGES.len() as u128) as usize]
}
