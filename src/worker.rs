//! Worker processes for the process-backed strategies.
//!
//! The parent writes one [`WorkRequest`] frame per group to a child's stdin
//! and reads one [`WorkResponse`] frame back from its stdout. A frame is a
//! 4-byte big-endian length followed by a bincode payload. The child loops in
//! [`serve`] until its stdin reaches EOF.

use crate::error::BenchError;
use crate::partition::Group;
use crate::strategy::evaluate;
use crate::workload::Workload;
use serde::{Deserialize, Serialize};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct WorkRequest {
    pub group: usize,
    pub workload: String,
    pub values: Vec<i64>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct WorkResponse {
    pub group: usize,
    pub outcome: Result<Vec<bool>, String>,
}

pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, record: &T) -> Result<(), BenchError> {
    let bytes = bincode::serialize(record)?;
    let len = u32::try_from(bytes.len())
        .map_err(|_| BenchError::Protocol(format!("frame of {} bytes is too large", bytes.len())))?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame, or `None` on a clean EOF before the length prefix.
pub fn read_frame<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> Result<Option<T>, BenchError> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_bytes) as usize;
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;

    Ok(Some(bincode::deserialize(&data)?))
}

/// Child side: answers requests until the parent closes the pipe.
pub fn serve<R: Read, W: Write>(reader: R, writer: W) -> Result<(), BenchError> {
    let mut reader = BufReader::new(reader);
    let mut writer = BufWriter::new(writer);

    while let Some(request) = read_frame::<_, WorkRequest>(&mut reader)? {
        let outcome = match Workload::lookup(&request.workload) {
            Some(workload) => evaluate(&request.values, workload),
            None => Err(format!("unknown workload '{}'", request.workload)),
        };
        write_frame(
            &mut writer,
            &WorkResponse {
                group: request.group,
                outcome,
            },
        )?;
    }

    Ok(())
}

/// How to launch a worker process.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec!["worker".to_string()],
        }
    }

    /// Re-executes the running binary in worker mode.
    pub fn current_exe() -> Result<Self, BenchError> {
        Ok(Self::new(std::env::current_exe()?))
    }
}

/// Parent-side handle on one child process.
pub struct WorkerProcess {
    command: WorkerCommand,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    broken: bool,
}

impl WorkerProcess {
    pub fn spawn(command: &WorkerCommand) -> io::Result<Self> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "worker stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "worker stdout unavailable"))?;

        Ok(WorkerProcess {
            command: command.clone(),
            child,
            stdin: BufWriter::new(stdin),
            stdout: BufReader::new(stdout),
            broken: false,
        })
    }

    /// Starts `count` workers, or none at all.
    pub fn spawn_many(command: &WorkerCommand, count: usize) -> io::Result<Vec<Self>> {
        let mut workers = Vec::with_capacity(count);
        for _ in 0..count {
            match WorkerProcess::spawn(command) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    workers.into_iter().for_each(WorkerProcess::shutdown);
                    return Err(e);
                }
            }
        }
        Ok(workers)
    }

    /// Ships one group to the child and waits for its answer.
    ///
    /// The outer error means no live process could be had for this group. The
    /// inner one is a failure of the group itself: the child reported it, or
    /// the process died mid-request and will be respawned on next use.
    pub fn evaluate(&mut self, group: &Group, workload: Workload) -> io::Result<Result<Vec<bool>, String>> {
        if !workload.is_registered() {
            return Ok(Err(format!(
                "workload '{}' is not the registered function of that name",
                workload.name
            )));
        }
        if self.broken {
            self.respawn()?;
        }

        let request = WorkRequest {
            group: group.index,
            workload: workload.name.to_string(),
            values: group.values().to_vec(),
        };

        match self.round_trip(&request) {
            Ok(response) => Ok(response.outcome),
            Err(err) => {
                self.broken = true;
                Ok(Err(format!("worker process {} failed: {}", self.child.id(), err)))
            }
        }
    }

    fn round_trip(&mut self, request: &WorkRequest) -> Result<WorkResponse, BenchError> {
        write_frame(&mut self.stdin, request)?;
        let response: WorkResponse = read_frame(&mut self.stdout)?
            .ok_or_else(|| BenchError::Protocol("worker closed its output".to_string()))?;
        if response.group != request.group {
            return Err(BenchError::Protocol(format!(
                "expected response for group {}, got group {}",
                request.group, response.group
            )));
        }
        Ok(response)
    }

    fn respawn(&mut self) -> io::Result<()> {
        log::warn!("respawning broken worker process {}", self.child.id());
        let replacement = WorkerProcess::spawn(&self.command)?;
        let old = std::mem::replace(self, replacement);
        old.shutdown();
        Ok(())
    }

    /// Closes the child's stdin and waits for it to exit.
    pub fn shutdown(self) {
        let WorkerProcess { mut child, stdin, broken, .. } = self;
        drop(stdin);
        if broken {
            let _ = child.kill();
        }
        if let Err(e) = child.wait() {
            log::warn!("failed to reap worker process {}: {}", child.id(), e);
        }
    }
}
