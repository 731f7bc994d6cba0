use std::{
    fs::{File, OpenOptions},
    io,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
    process::{Child, Command as Process, Stdio},
};

use os_pipe::PipeReader;
use tracing::{debug, trace};

use crate::{
    error::ShellError,
    instruction::{Command, Pipeline, Redirect},
};

//A process started for one pipeline stage. Must be reaped before the pipeline returns.
#[derive(Debug)]
pub struct Stage {
    pub index: usize,
    pub name: String,
    pub child: Child,
}

//Outcome of a spawn attempt: every stage that did start, plus the error that stopped the rest
#[derive(Debug)]
pub struct Spawned {
    pub stages: Vec<Stage>,
    pub error: Option<ShellError>,
}

/*
Starts one process per pipeline stage and wires them together.

Pipes are allocated lazily, one per stage boundary. Ownership of each end is
handed to exactly one std::process::Command; the builder is dropped right after
spawn so the shell never keeps a copy of a pipe end that a stage owns. The only
descriptor the shell holds between two spawns is the read end waiting for the
next stage. os_pipe and std open everything close-on-exec, so a child only ever
sees the two ends dup'ed onto its stdin/stdout.
*/
pub struct Orchestrator<'a> {
    cwd: &'a Path,
    redirect_mode: u32,
}

impl<'a> Orchestrator<'a> {
    pub fn new(cwd: &'a Path, redirect_mode: u32) -> Self {
        Self { cwd, redirect_mode }
    }

    //Relative paths are taken from the session's working directory, not the process's
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    //Names without a slash are looked up on PATH by the OS
    fn program(&self, name: &str) -> PathBuf {
        if name.contains('/') {
            self.resolve(Path::new(name))
        } else {
            PathBuf::from(name)
        }
    }

    //Open failures are reported against the stage the file belongs to
    fn open_input(&self, index: usize, command: &Command, path: &Path) -> Result<File, ShellError> {
        File::open(self.resolve(path)).map_err(|cause| redirect_error(index, command, path, cause))
    }

    fn open_output(&self, index: usize, command: &Command, path: &Path) -> Result<File, ShellError> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(self.redirect_mode)
            .open(self.resolve(path))
            .map_err(|cause| redirect_error(index, command, path, cause))
    }

    pub fn spawn_all(&self, pipeline: &Pipeline) -> Spawned {
        let mut stages = Vec::with_capacity(pipeline.commands().len());
        let error = self.spawn_stages(pipeline, &mut stages).err();
        Spawned { stages, error }
    }

    /*
    Stops at the first stage that cannot be started. Stages already running are
    left alone; dropping the pending read end makes the upstream writer see a
    broken pipe instead of blocking forever.
    */
    fn spawn_stages(&self, pipeline: &Pipeline, stages: &mut Vec<Stage>) -> Result<(), ShellError> {
        let last = pipeline.last_index();
        let mut upstream: Option<PipeReader> = None;

        for (index, command) in pipeline.commands().iter().enumerate() {
            let stdin: Stdio = match (upstream.take(), pipeline.input()) {
                (Some(reader), _) => reader.into(),
                (None, Redirect::InputFile(path)) if index == 0 => {
                    self.open_input(index, command, path)?.into()
                }
                _ => Stdio::inherit(),
            };

            let stdout: Stdio = if index < last {
                let (reader, writer) = os_pipe::pipe().map_err(ShellError::PipeAllocation)?;
                trace!(boundary = index, "allocated pipe");
                upstream = Some(reader);
                writer.into()
            } else if let Redirect::OutputFile(path) = pipeline.output() {
                self.open_output(index, command, path)?.into()
            } else {
                Stdio::inherit()
            };

            let child = self.spawn_stage(index, command, stdin, stdout)?;
            stages.push(Stage {
                index,
                name: command.name().to_string(),
                child,
            });
        }
        Ok(())
    }

    fn spawn_stage(
        &self,
        index: usize,
        command: &Command,
        stdin: Stdio,
        stdout: Stdio,
    ) -> Result<Child, ShellError> {
        let mut process = Process::new(self.program(command.name()));
        process
            .args(command.args())
            .current_dir(self.cwd)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::inherit());

        let result = process.spawn();
        //Closes the shell's copies of this stage's stdin/stdout
        drop(process);

        match result {
            Ok(child) => {
                debug!(stage = index, pid = child.id(), argv = ?command.argv(), "spawned");
                Ok(child)
            }
            Err(cause) => Err(ShellError::Spawn {
                stage_index: index,
                command_name: command.name().to_string(),
                cause,
            }),
        }
    }
}

fn redirect_error(index: usize, command: &Command, path: &Path, cause: io::Error) -> ShellError {
    debug!(stage = index, command = command.name(), path = %path.display(), "redirect open failed");
    ShellError::RedirectOpen {
        stage_index: index,
        command_name: command.name().to_string(),
        path: path.to_path_buf(),
        cause,
    }
}
