use std::{io, process::ExitStatus};

use tracing::{debug, warn};

use super::spawn::Stage;
use crate::error::ShellError;

#[derive(Debug, Default)]
pub struct Reaped {
    pub statuses: Vec<(usize, ExitStatus)>, //(stage index, status)
    pub errors: Vec<ShellError>,
}

impl Reaped {
    pub fn status_of(&self, index: usize) -> Option<ExitStatus> {
        self.statuses
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, status)| *status)
    }
}

fn wait_for(stage: &mut Stage) -> io::Result<ExitStatus> {
    loop {
        match stage.child.wait() {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/*
Waits for every spawned stage. Only descriptor lifetimes decide when a stage
finishes, so the order of the waits does not matter. Failures are collected and
never stop the remaining waits.
*/
pub fn reap_all(stages: Vec<Stage>) -> Reaped {
    let mut reaped = Reaped::default();
    for mut stage in stages {
        match wait_for(&mut stage) {
            Ok(status) => {
                debug!(stage = stage.index, command = %stage.name, %status, "reaped");
                reaped.statuses.push((stage.index, status));
            }
            Err(cause) => {
                warn!(stage = stage.index, command = %stage.name, "wait failed: {}", cause);
                reaped.errors.push(ShellError::Reap {
                    command_name: stage.name,
                    cause,
                });
            }
        }
    }
    reaped
}
