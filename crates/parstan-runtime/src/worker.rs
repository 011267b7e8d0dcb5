use crate::config::RunConfig;
use crate::{Error, Result};
use parstan_types::{Chunk, WorkerOutput};
use std::ffi::OsString;
use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Environment variable through which workers learn the shared scratch directory
pub const SCRATCH_DIR_VAR: &str = "PARSTAN_SCRATCH_DIR";

/// Level passed to workers when none was requested. Severity filtering happens once, at the
/// final format stage, so sub-runs must not filter on their own.
pub const FLOOR_LEVEL: &str = "0";

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Command-line arguments for one engine invocation over `chunk`.
pub fn engine_args(config: &RunConfig, chunk: &Chunk) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["analyse".into()];

    if let Some(project_config) = &config.project_config {
        args.push("--configuration".into());
        args.push(project_config.into());
    }

    if config.no_progress {
        args.push("--no-progress".into());
    }

    if let Some(autoload_file) = &config.autoload_file {
        args.push("--autoload-file".into());
        args.push(autoload_file.into());
    }

    args.push("--level".into());
    args.push(config.level.as_deref().unwrap_or(FLOOR_LEVEL).into());
    args.push("--error-format".into());
    args.push("json".into());

    args.extend(chunk.files().iter().map(OsString::from));
    args
}

/// Drains one pipe on a background thread so the child never blocks on a full pipe.
struct StreamPump {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl StreamPump {
    fn start<R>(name: String, mut reader: R) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);

        let handle = std::thread::Builder::new().name(name).spawn(move || {
            let mut chunk = [0u8; READ_BUFFER_SIZE];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => sink
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend_from_slice(&chunk[..n]),
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        })?;

        Ok(Self {
            buffer,
            handle: Some(handle),
        })
    }

    /// Bytes past `cursor`, advancing it.
    fn read_from(&self, cursor: &mut usize) -> Vec<u8> {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        if buffer.len() <= *cursor {
            return Vec::new();
        }
        let fresh = buffer[*cursor..].to_vec();
        *cursor = buffer.len();
        fresh
    }

    /// Wait until the pipe reached EOF.
    fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("output pump thread panicked");
        }
    }

    fn into_bytes(mut self) -> Vec<u8> {
        self.join();
        std::mem::take(&mut *self.buffer.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// One running engine subprocess analysing one chunk.
pub struct WorkerProcess {
    index: usize,
    file_count: usize,
    child: Child,
    stdout: StreamPump,
    stderr: StreamPump,
    stderr_cursor: usize,
}

impl WorkerProcess {
    /// Start the engine on `chunk`. Returns as soon as the process is running.
    pub fn spawn(chunk: &Chunk, config: &RunConfig) -> Result<Self> {
        let index = chunk.index();
        let spawn_error = |source| Error::Spawn {
            worker: index,
            source,
        };

        let mut child = Command::new(&config.engine)
            .args(engine_args(config, chunk))
            .current_dir(&config.working_dir)
            .env(SCRATCH_DIR_VAR, &config.scratch_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let pumps = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => {
                StreamPump::start(format!("worker-{}-stdout", index), stdout).and_then(|out| {
                    StreamPump::start(format!("worker-{}-stderr", index), stderr)
                        .map(|err| (out, err))
                })
            }
            _ => Err(io::Error::other("worker pipes were not captured")),
        };

        let (stdout, stderr) = match pumps {
            Ok(pumps) => pumps,
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(spawn_error(err));
            }
        };

        tracing::debug!(
            worker = index,
            pid = child.id(),
            files = chunk.len(),
            "spawned worker"
        );

        Ok(Self {
            index,
            file_count: chunk.len(),
            child,
            stdout,
            stderr,
            stderr_cursor: 0,
        })
    }

    /// Index of the chunk this worker analyses.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Stderr bytes produced since the previous call.
    pub fn poll_incremental_stderr(&mut self) -> Vec<u8> {
        self.stderr.read_from(&mut self.stderr_cursor)
    }

    pub fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(status) => status.is_none(),
            Err(err) => {
                tracing::warn!(worker = self.index, "cannot query worker status: {}", err);
                false
            }
        }
    }

    /// Block until both output pipes are closed, so every byte is buffered.
    pub fn drain_streams(&mut self) {
        self.stdout.join();
        self.stderr.join();
    }

    pub fn kill(&mut self) {
        if let Err(err) = self.child.kill() {
            tracing::debug!(worker = self.index, "kill failed: {}", err);
        }
    }

    /// Wait for the process and hand back everything it printed.
    pub fn collect_final_output(mut self) -> WorkerOutput {
        let exit_code = match self.child.wait() {
            Ok(status) => status.code(),
            Err(err) => {
                tracing::warn!(worker = self.index, "cannot wait for worker: {}", err);
                None
            }
        };

        WorkerOutput {
            stdout: self.stdout.into_bytes(),
            stderr: self.stderr.into_bytes(),
            exit_code,
        }
    }
}
