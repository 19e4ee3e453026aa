//! In-memory executors for scheduler tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use cadence_terminal::{CommandExecutor, ExecResult, Result, TerminalError};

/// Succeeds instantly and records every command it is given.
#[derive(Default)]
pub struct CountingExecutor {
    commands: Mutex<Vec<String>>,
}

impl CountingExecutor {
    pub fn calls(&self) -> usize {
        self.commands.lock().unwrap().len()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for CountingExecutor {
    async fn execute(&self, command: &str) -> Result<ExecResult> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(ExecResult {
            exit_code: 0,
            stdout: format!("ran {command}\n"),
            stderr: String::new(),
        })
    }
}

/// Alternates between a non-zero exit and a spawn failure.
#[derive(Default)]
pub struct FailingExecutor {
    attempts: AtomicUsize,
}

impl FailingExecutor {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandExecutor for FailingExecutor {
    async fn execute(&self, _command: &str) -> Result<ExecResult> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if n % 2 == 0 {
            Ok(ExecResult {
                exit_code: 1,
                stdout: String::new(),
                stderr: "boom".into(),
            })
        } else {
            Err(TerminalError::Spawn("no such shell".into()))
        }
    }
}

/// Never finishes; counts how many commands were started.
#[derive(Default)]
pub struct HangingExecutor {
    started: AtomicUsize,
}

impl HangingExecutor {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandExecutor for HangingExecutor {
    async fn execute(&self, _command: &str) -> Result<ExecResult> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Panics on every call, standing in for a buggy executor.
pub struct PanickingExecutor;

#[async_trait]
impl CommandExecutor for PanickingExecutor {
    async fn execute(&self, command: &str) -> Result<ExecResult> {
        panic!("executor blew up on {command:?}");
    }
}
