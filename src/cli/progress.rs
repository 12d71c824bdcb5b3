//! Terminal rendering of pipeline progress events.

use crate::core::progress::ProgressBus;
use crate::models::progress::{Stage, StageStatus};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Draw a progress bar for `stage` until it completes or the bus closes.
pub fn attach(bus: &ProgressBus, stage: Stage) -> JoinHandle<()> {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        let pb = ProgressBar::new(0);
        pb.set_style(bar_style());

        loop {
            match events.recv().await {
                Ok(event) if event.stage == stage => match event.status {
                    StageStatus::Executing => {
                        pb.set_length(event.total as u64);
                        pb.set_position(event.current as u64);
                        pb.set_message(event.message);
                    }
                    StageStatus::Complete => {
                        pb.set_position(event.total as u64);
                        pb.finish_with_message(event.message);
                        break;
                    }
                    StageStatus::Error => {
                        pb.abandon_with_message(event.message);
                        break;
                    }
                    StageStatus::Idle => {}
                },
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => {
                    pb.finish_and_clear();
                    break;
                }
            }
        }
    })
}
