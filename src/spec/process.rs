//! Declarative description of one supervised process.
//!
//! [`ProcessSpec`] bundles everything the launcher and the supervising
//! actor need: command line, working directory, environment, instance
//! count and execution mode, restart/backoff policies with an explicit
//! restart budget, an optional memory ceiling, termination and readiness
//! windows, and log destinations.
//!
//! Specs are created through the fluent [`ProcessSpecBuilder`]:
//!
//! ```
//! use std::time::Duration;
//! use procvisor::{ProcessSpec, RestartPolicy};
//!
//! let web = ProcessSpec::builder("web", "yarn")
//!     .args(["workspace", "@acme/web", "start"])
//!     .env("NODE_ENV", "production")
//!     .env("PORT", "3000")
//!     .restart(RestartPolicy::Always)
//!     .max_restarts(Some(16))
//!     .max_memory(Some(2 * 1024 * 1024 * 1024))
//!     .kill_timeout(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(web.name(), "web");
//! assert_eq!(web.instances(), 1);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::policies::{BackoffPolicy, RestartPolicy};

/// How instances of a process are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecMode {
    /// Plain child processes (default).
    #[default]
    Fork,
    /// Multiple coordinated copies; each child receives its instance index
    /// in the `PROCVISOR_INSTANCE` environment variable.
    Cluster,
}

/// How a freshly spawned process is considered ready (RUNNING).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ReadyPolicy {
    /// Ready as soon as the OS spawn succeeds (default).
    #[default]
    Immediate,
    /// Ready when a stdout line containing this needle is observed, or
    /// when the spec's `ready_timeout` elapses without one.
    LineMatch(String),
}

/// Log file destinations for one process.
///
/// All paths are opened in append mode on every (re)start; existing
/// content is never truncated. With several instances, all instances of a
/// process append to the same files.
#[derive(Clone, Debug)]
pub struct LogPaths {
    /// Destination for stdout lines.
    pub stdout: PathBuf,
    /// Destination for stderr lines.
    pub stderr: PathBuf,
    /// Optional combined destination receiving both streams.
    pub combined: Option<PathBuf>,
    /// Prefix each line with a wall-clock timestamp.
    pub timestamps: bool,
}

impl LogPaths {
    /// Creates log paths with separate stdout/stderr files, no combined
    /// file, and no timestamps.
    pub fn new(stdout: impl Into<PathBuf>, stderr: impl Into<PathBuf>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            combined: None,
            timestamps: false,
        }
    }

    /// Also append both streams to a combined file.
    pub fn combined(mut self, path: impl Into<PathBuf>) -> Self {
        self.combined = Some(path.into());
        self
    }

    /// Prefix each line with a timestamp.
    pub fn timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }
}

/// Specification for one supervised process.
///
/// Immutable once built; the [`SpecStore`](crate::SpecStore) hands out
/// `Arc` references to actors and the launcher.
#[derive(Clone, Debug)]
pub struct ProcessSpec {
    name: String,
    command: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: HashMap<String, String>,
    instances: u32,
    exec_mode: ExecMode,
    restart: RestartPolicy,
    backoff: BackoffPolicy,
    max_restarts: Option<u32>,
    max_memory: Option<u64>,
    kill_timeout: Duration,
    ready_timeout: Duration,
    ready: ReadyPolicy,
    logs: Option<LogPaths>,
}

impl ProcessSpec {
    /// Creates a builder for the given process name and command.
    pub fn builder(name: impl Into<String>, command: impl Into<String>) -> ProcessSpecBuilder {
        ProcessSpecBuilder::new(name, command)
    }

    /// Unique process name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Program to execute.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Arguments passed to the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Working directory, if one was configured.
    pub fn cwd(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    /// Environment variables set for the child.
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Number of instances to run (>= 1 after validation).
    pub fn instances(&self) -> u32 {
        self.instances
    }

    /// Execution mode.
    pub fn exec_mode(&self) -> ExecMode {
        self.exec_mode
    }

    /// Restart policy.
    pub fn restart(&self) -> RestartPolicy {
        self.restart
    }

    /// Backoff policy for restart delays.
    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Restart budget: maximum restarts per actor run (`None` = unbounded).
    pub fn max_restarts(&self) -> Option<u32> {
        self.max_restarts
    }

    /// Resident-memory ceiling in bytes (`None` = unlimited).
    pub fn max_memory(&self) -> Option<u64> {
        self.max_memory
    }

    /// Grace window between SIGTERM and SIGKILL when stopping.
    pub fn kill_timeout(&self) -> Duration {
        self.kill_timeout
    }

    /// Maximum time to wait for a readiness signal before the instance is
    /// considered RUNNING anyway.
    pub fn ready_timeout(&self) -> Duration {
        self.ready_timeout
    }

    /// Readiness policy.
    pub fn ready(&self) -> &ReadyPolicy {
        &self.ready
    }

    /// Log destinations, if any.
    pub fn logs(&self) -> Option<&LogPaths> {
        self.logs.as_ref()
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::SpecError> {
        if self.name.is_empty() {
            return Err(crate::error::SpecError::EmptyName);
        }
        if self.command.is_empty() {
            return Err(crate::error::SpecError::EmptyCommand {
                name: self.name.clone(),
            });
        }
        if self.instances < 1 {
            return Err(crate::error::SpecError::NoInstances {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Fluent builder for [`ProcessSpec`].
#[derive(Clone, Debug)]
pub struct ProcessSpecBuilder {
    spec: ProcessSpec,
}

impl ProcessSpecBuilder {
    /// Creates a builder with defaults: one Fork instance, `OnFailure`
    /// restart with default backoff and a budget of 16 restarts, no memory
    /// ceiling, 5s kill timeout, 10s ready timeout, immediate readiness,
    /// no log files.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            spec: ProcessSpec {
                name: name.into(),
                command: command.into(),
                args: Vec::new(),
                cwd: None,
                env: HashMap::new(),
                instances: 1,
                exec_mode: ExecMode::Fork,
                restart: RestartPolicy::default(),
                backoff: BackoffPolicy::default(),
                max_restarts: Some(16),
                max_memory: None,
                kill_timeout: Duration::from_secs(5),
                ready_timeout: Duration::from_secs(10),
                ready: ReadyPolicy::Immediate,
                logs: None,
            },
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.spec.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec.cwd = Some(dir.into());
        self
    }

    /// Sets one environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.env.insert(key.into(), value.into());
        self
    }

    /// Sets the instance count.
    pub fn instances(mut self, n: u32) -> Self {
        self.spec.instances = n;
        self
    }

    /// Sets the execution mode.
    pub fn exec_mode(mut self, mode: ExecMode) -> Self {
        self.spec.exec_mode = mode;
        self
    }

    /// Sets the restart policy.
    pub fn restart(mut self, restart: RestartPolicy) -> Self {
        self.spec.restart = restart;
        self
    }

    /// Sets the backoff policy.
    pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.spec.backoff = backoff;
        self
    }

    /// Sets the restart budget (`None` = unbounded; make that choice
    /// deliberately).
    pub fn max_restarts(mut self, budget: Option<u32>) -> Self {
        self.spec.max_restarts = budget;
        self
    }

    /// Sets the resident-memory ceiling in bytes.
    pub fn max_memory(mut self, bytes: Option<u64>) -> Self {
        self.spec.max_memory = bytes;
        self
    }

    /// Sets the SIGTERM-to-SIGKILL grace window.
    pub fn kill_timeout(mut self, d: Duration) -> Self {
        self.spec.kill_timeout = d;
        self
    }

    /// Sets the readiness window.
    pub fn ready_timeout(mut self, d: Duration) -> Self {
        self.spec.ready_timeout = d;
        self
    }

    /// Sets the readiness policy.
    pub fn ready(mut self, ready: ReadyPolicy) -> Self {
        self.spec.ready = ready;
        self
    }

    /// Sets the log destinations.
    pub fn logs(mut self, logs: LogPaths) -> Self {
        self.spec.logs = Some(logs);
        self
    }

    /// Finishes the builder.
    ///
    /// Validation happens in [`SpecStore::load`](crate::SpecStore::load),
    /// where cross-spec rules (unique names) can be checked too.
    pub fn build(self) -> ProcessSpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let spec = ProcessSpec::builder("web", "sleep").arg("100").build();
        assert_eq!(spec.name(), "web");
        assert_eq!(spec.command(), "sleep");
        assert_eq!(spec.args(), ["100"]);
        assert_eq!(spec.instances(), 1);
        assert_eq!(spec.exec_mode(), ExecMode::Fork);
        assert_eq!(spec.restart(), RestartPolicy::OnFailure);
        assert_eq!(spec.max_restarts(), Some(16));
        assert!(spec.max_memory().is_none());
        assert!(spec.logs().is_none());
    }

    #[test]
    fn validate_rejects_empty_command() {
        let spec = ProcessSpec::builder("web", "").build();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_instances() {
        let spec = ProcessSpec::builder("web", "sleep").instances(0).build();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn log_paths_builder() {
        let logs = LogPaths::new("out.log", "err.log")
            .combined("all.log")
            .timestamps();
        assert!(logs.combined.is_some());
        assert!(logs.timestamps);
    }
}
