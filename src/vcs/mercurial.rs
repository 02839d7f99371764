use crate::error::{BumpvError, Result};
use crate::vcs::{TagInfo, Vcs};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Upper bound on how long a single `hg` invocation may run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Mercurial support through the `hg` executable.
pub struct MercurialVcs {
    dir: PathBuf,
    program: PathBuf,
    timeout: Duration,
}

impl MercurialVcs {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        MercurialVcs {
            dir: dir.as_ref().to_path_buf(),
            program: PathBuf::from("hg"),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses `program` instead of the `hg` found on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Runs `hg` with `args` in the working directory.
    ///
    /// Both output pipes are drained while the process runs, so a chatty
    /// command cannot stall on a full pipe.
    ///
    /// # Returns
    /// * `Ok(String)` - Standard output of a successful run
    /// * `Err(BumpvError::VcsCommand)` - If `hg` cannot be started, exits
    ///   unsuccessfully or outlives the timeout
    fn run(&self, args: &[&str]) -> Result<String> {
        let command = format!("hg {}", args.join(" "));
        tracing::debug!("Running '{}' in {}", command, self.dir.display());

        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(&self.dir)
            .env("HGENCODING", "utf-8")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BumpvError::vcs(&command, e.to_string()))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                // the process may have exited in the meantime
                let _ = child.kill();
                let _ = child.wait();
                return Err(BumpvError::vcs(
                    &command,
                    format!("timed out after {}s", self.timeout.as_secs_f32()),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);
        if !status.success() {
            return Err(BumpvError::vcs(
                &command,
                format!(
                    "exit code {}\nStdout: {}\nStderr: {}",
                    status.code().unwrap_or(-1),
                    stdout.trim(),
                    stderr.trim()
                ),
            ));
        }

        Ok(stdout)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

impl Vcs for MercurialVcs {
    fn name(&self) -> &'static str {
        "Mercurial"
    }

    fn is_usable(&self) -> bool {
        self.run(&["root"]).is_ok()
    }

    fn assert_nondirty(&self) -> Result<()> {
        let output = self.run(&["status", "-mard"])?;
        let changes: Vec<&str> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("??"))
            .collect();

        if changes.is_empty() {
            Ok(())
        } else {
            Err(BumpvError::WorkingDirectoryIsDirty(format!(
                "Mercurial working directory is not clean:\n{}",
                changes.join("\n")
            )))
        }
    }

    fn add_path(&self, _paths: &[PathBuf]) -> Result<()> {
        // hg commit picks up every modified tracked file
        Ok(())
    }

    fn commit(&self, message: &str, dry_run: bool) -> Result<()> {
        if dry_run {
            tracing::info!("Would commit to Mercurial with message '{}'", message);
            return Ok(());
        }
        self.run(&["commit", "-m", message])?;
        tracing::info!("Committed to Mercurial with message '{}'", message);
        Ok(())
    }

    fn tag(&self, name: &str) -> Result<()> {
        self.run(&["tag", name])?;
        tracing::info!("Tagged Mercurial revision as '{}'", name);
        Ok(())
    }

    fn latest_tag_info(&self) -> Result<TagInfo> {
        Ok(TagInfo::default())
    }
}
