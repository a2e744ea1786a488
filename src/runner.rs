//! Host driver running a `Computer` on a dedicated thread.
//!
//! The computer lives behind a single lock taken for a whole slice of
//! instructions, so the host only ever sees it between instructions. Slices
//! are paced to wall time and the host steers the thread with
//! `RunnerCommand`s.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};

use crate::computer::Computer;
use crate::errors::BkError;
use crate::metrics::Collector;
use crate::settings::ComputerSettings;
use crate::types::SharedComputer;

const THREAD_NAME: &str = "bk-cpu";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerCommand {
    Resume,
    Pause,
    Reset,
    Stop,
}

pub struct Runner {
    computer: SharedComputer,
    commands: Sender<RunnerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl Runner {
    pub fn start(computer: Computer, settings: ComputerSettings) -> Result<Self, BkError> {
        let computer = Arc::new(Mutex::new(computer));
        let (sender, receiver) = unbounded();

        let computer_ptr = Arc::clone(&computer);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run_loop(computer_ptr, receiver, settings))
            .map_err(|error| BkError::RunnerError {
                details: error.to_string(),
            })?;
        info!("Runner started");

        Ok(Self {
            computer,
            commands: sender,
            handle: Some(handle),
        })
    }

    pub fn resume(&self) -> Result<(), BkError> {
        self.send(RunnerCommand::Resume)
    }

    pub fn pause(&self) -> Result<(), BkError> {
        self.send(RunnerCommand::Pause)
    }

    pub fn reset(&self) -> Result<(), BkError> {
        self.send(RunnerCommand::Reset)
    }

    /// Run `f` on the computer between two slices
    pub fn with_computer<T>(&self, f: impl FnOnce(&mut Computer) -> T) -> Result<T, BkError> {
        let mut computer = self.computer.lock().map_err(|_| BkError::RunnerError {
            details: "computer lock poisoned".to_string(),
        })?;
        Ok(f(&mut computer))
    }

    /// Stop the thread and hand the computer back
    pub fn stop(mut self) -> Result<Computer, BkError> {
        self.shutdown()?;
        let computer = Arc::clone(&self.computer);
        drop(self);

        let computer = Arc::try_unwrap(computer).map_err(|_| BkError::RunnerError {
            details: "computer still shared after stop".to_string(),
        })?;
        computer.into_inner().map_err(|_| BkError::RunnerError {
            details: "computer lock poisoned".to_string(),
        })
    }

    fn send(&self, command: RunnerCommand) -> Result<(), BkError> {
        self.commands
            .send(command)
            .map_err(|_| BkError::RunnerError {
                details: format!("{THREAD_NAME} thread is gone, can't send {command:?}"),
            })
    }

    fn shutdown(&mut self) -> Result<(), BkError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        // the thread may have stopped on its own already
        let _ = self.commands.send(RunnerCommand::Stop);
        debug!("Waiting {THREAD_NAME} thread to end...");
        handle.join().map_err(|_| BkError::RunnerError {
            details: format!("{THREAD_NAME} thread panicked"),
        })?;
        info!("Runner stopped");
        Ok(())
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            error!("{error}");
        }
    }
}

fn run_loop(
    computer: SharedComputer,
    commands: Receiver<RunnerCommand>,
    settings: ComputerSettings,
) {
    let mut running = settings.start_running;
    let mut collector = Collector::new();

    loop {
        let slice_start = Instant::now();

        if running {
            let Ok(mut computer) = computer.lock() else {
                error!("Computer lock poisoned, stopping {THREAD_NAME} thread");
                return;
            };
            let executed = computer.run(settings.instructions_per_slice);
            collector.observe_instructions(executed);

            if computer.cpu().is_halted() {
                info!("CPU halted, runner paused");
                running = false;
            }
        }

        if collector.elapsed() >= settings.metrics_period {
            let metrics = collector.collect();
            debug!(
                "{} instructions/s over {:?}",
                metrics.instructions_per_second, metrics.recorded_time
            );
        }

        let command = if running {
            let remaining = settings.slice_period.saturating_sub(slice_start.elapsed());
            match commands.recv_timeout(remaining) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(RunnerCommand::Stop),
            }
        } else {
            Some(commands.recv().unwrap_or(RunnerCommand::Stop))
        };

        match command {
            Some(RunnerCommand::Resume) => running = true,
            Some(RunnerCommand::Pause) => running = false,
            Some(RunnerCommand::Reset) => match computer.lock() {
                Ok(mut computer) => computer.reset(),
                Err(_) => {
                    error!("Computer lock poisoned, stopping {THREAD_NAME} thread");
                    return;
                }
            },
            Some(RunnerCommand::Stop) => return,
            None => {}
        }
    }
}
