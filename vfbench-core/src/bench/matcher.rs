//! Execution of a single matcher run.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use super::process::{kill_group, kill_tree, spawn_in_group, wait_timeout};
use super::Outcome;

/// One query/target pair to match.
#[derive(Debug, Clone, Copy)]
pub struct MatchRequest<'a> {
    pub query: &'a Path,
    pub target: &'a Path,
    pub timeout: Duration,
}

/// Something that can answer a [`MatchRequest`].
///
/// Implementations never fail: every problem becomes a failure [`Outcome`].
pub trait Matcher {
    fn run(&mut self, request: &MatchRequest<'_>) -> Outcome;
}

/// Runs an external matcher executable as
/// `<executable> <query> <target> [args...]`.
///
/// Standard output and standard error are redirected to files that are
/// truncated at the start of every run.
#[derive(Debug, Clone)]
pub struct ProcessMatcher {
    executable: PathBuf,
    args: Vec<String>,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
}

impl ProcessMatcher {
    pub fn new(
        executable: impl Into<PathBuf>,
        args: Vec<String>,
        stdout_path: impl Into<PathBuf>,
        stderr_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executable: executable.into(),
            args,
            stdout_path: stdout_path.into(),
            stderr_path: stderr_path.into(),
        }
    }

    fn execute(&self, request: &MatchRequest<'_>) -> io::Result<Outcome> {
        for path in [&self.stdout_path, &self.stderr_path] {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        let stdout = File::create(&self.stdout_path)?;
        let stderr = File::create(&self.stderr_path)?;

        let mut command = Command::new(&self.executable);
        command
            .arg(request.query)
            .arg(request.target)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);
        let mut child = spawn_in_group(&mut command)?;
        tracing::debug!(
            "Spawned {} (pid {}) for {}",
            self.executable.display(),
            child.id(),
            request.query.display()
        );

        let status = match wait_timeout(&mut child, request.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                tracing::warn!(
                    "{} exceeded {:?} on {}, killing process tree",
                    self.executable.display(),
                    request.timeout,
                    request.query.display()
                );
                kill_tree(&mut child);
                return Ok(Outcome::timeout());
            }
            Err(e) => {
                kill_tree(&mut child);
                return Err(e);
            }
        };
        // Background processes the matcher left behind
        kill_group(child.id());

        if status.success() {
            let output = fs::read(&self.stdout_path)?;
            let output = String::from_utf8_lossy(&output);
            let first_line = output.lines().next().unwrap_or("");
            return Ok(Outcome::from_matcher_output(first_line));
        }

        let diagnostics = fs::read(&self.stderr_path)?;
        let diagnostics = String::from_utf8_lossy(&diagnostics).into_owned();
        if diagnostics.trim().is_empty() {
            Ok(Outcome::failure(status.to_string()))
        } else {
            Ok(Outcome::failure(diagnostics))
        }
    }
}

impl Matcher for ProcessMatcher {
    fn run(&mut self, request: &MatchRequest<'_>) -> Outcome {
        match self.execute(request) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Failed to run {}: {}", self.executable.display(), e);
                Outcome::driver_error(e)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Instant;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        query: PathBuf,
        target: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let query = dir.path().join("q_0.graph");
            let target = dir.path().join("target.graph");
            fs::write(&query, "1\n0 a\n0\n").unwrap();
            fs::write(&target, "1\n0 a\n0\n").unwrap();
            Self { dir, query, target }
        }

        fn script(&self, body: &str) -> PathBuf {
            let path = self.dir.path().join("matcher.sh");
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn matcher(&self, executable: PathBuf, args: &[&str]) -> ProcessMatcher {
            ProcessMatcher::new(
                executable,
                args.iter().map(|a| a.to_string()).collect(),
                self.dir.path().join("logs/run.stdout"),
                self.dir.path().join("logs/run.stderr"),
            )
        }

        fn request(&self, timeout: Duration) -> MatchRequest<'_> {
            MatchRequest {
                query: &self.query,
                target: &self.target,
                timeout,
            }
        }
    }

    #[test]
    fn test_success_parses_first_line() {
        let fx = Fixture::new();
        let mut matcher = fx.matcher(fx.script("echo '5 0.25 1.5'\necho 'ignored 1 2 3'"), &[]);
        let outcome = matcher.run(&fx.request(Duration::from_secs(10)));
        assert_eq!(
            outcome,
            Outcome::Success {
                num_sol: 5,
                first_solution_time: 0.25,
                running_time: 1.5
            }
        );
    }

    #[test]
    fn test_arguments_order() {
        let fx = Fixture::new();
        let mut matcher = fx.matcher(
            fx.script("echo \"$@\" > \"$(dirname \"$1\")/argv\"\necho '0 0 0'"),
            &["-e", "-u"],
        );
        assert!(matcher.run(&fx.request(Duration::from_secs(10))).is_success());

        let argv = fs::read_to_string(fx.dir.path().join("argv")).unwrap();
        assert_eq!(
            argv.trim(),
            format!("{} {} -e -u", fx.query.display(), fx.target.display())
        );
    }

    #[test]
    fn test_nonzero_exit_records_stderr() {
        let fx = Fixture::new();
        let mut matcher = fx.matcher(fx.script("echo 'bad graph' >&2\nexit 2"), &[]);
        let outcome = matcher.run(&fx.request(Duration::from_secs(10)));
        assert_eq!(outcome.error_info(), Some("bad graph\n"));
    }

    #[test]
    fn test_nonzero_exit_without_stderr() {
        let fx = Fixture::new();
        let mut matcher = fx.matcher(fx.script("exit 4"), &[]);
        let outcome = matcher.run(&fx.request(Duration::from_secs(10)));
        assert!(outcome.error_info().unwrap().contains('4'));
    }

    #[test]
    fn test_unparseable_output() {
        let fx = Fixture::new();
        let mut matcher = fx.matcher(fx.script("echo 'hello'"), &[]);
        let outcome = matcher.run(&fx.request(Duration::from_secs(10)));
        assert_eq!(outcome.error_info(), Some("Unparseable output: hello"));
    }

    #[test]
    fn test_missing_executable_is_driver_error() {
        let fx = Fixture::new();
        let mut matcher = fx.matcher(fx.dir.path().join("does-not-exist"), &[]);
        let outcome = matcher.run(&fx.request(Duration::from_secs(10)));
        assert!(outcome.error_info().unwrap().starts_with("Driver error:"));
        assert!(!outcome.is_timeout());
    }

    #[test]
    fn test_timeout_kills_process_tree() {
        let fx = Fixture::new();
        let pid_file = fx.dir.path().join("grandchild.pid");
        let body = format!("sleep 30 &\necho $! > '{}'\nwait", pid_file.display());
        let mut matcher = fx.matcher(fx.script(&body), &[]);

        let start = Instant::now();
        let outcome = matcher.run(&fx.request(Duration::from_millis(500)));
        assert!(outcome.is_timeout());
        assert!(start.elapsed() < Duration::from_secs(10));

        #[cfg(target_os = "linux")]
        {
            let pid: u32 = fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
            assert!(!is_alive(pid), "grandchild {} survived", pid);
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_timeout_kills_orphaned_background_job() {
        let fx = Fixture::new();
        let pid_file = fx.dir.path().join("orphan.pid");
        let body = format!("( sleep 30 & echo $! > '{}' )\nsleep 30", pid_file.display());
        let mut matcher = fx.matcher(fx.script(&body), &[]);

        let outcome = matcher.run(&fx.request(Duration::from_millis(500)));
        assert!(outcome.is_timeout());

        let pid: u32 = fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        assert!(!is_alive(pid), "orphan {} survived", pid);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_finished_run_leaves_no_background_job() {
        let fx = Fixture::new();
        let pid_file = fx.dir.path().join("straggler.pid");
        let body = format!("sleep 30 &\necho $! > '{}'\necho '1 0.1 0.2'", pid_file.display());
        let mut matcher = fx.matcher(fx.script(&body), &[]);

        assert!(matcher.run(&fx.request(Duration::from_secs(10))).is_success());

        let pid: u32 = fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        assert!(!is_alive(pid), "straggler {} survived", pid);
    }

    #[cfg(target_os = "linux")]
    fn is_alive(pid: u32) -> bool {
        for _ in 0..50 {
            let Ok(stat) = fs::read_to_string(format!("/proc/{}/stat", pid)) else {
                return false;
            };
            let state = stat
                .rfind(')')
                .and_then(|i| stat[i + 1..].split_whitespace().next());
            if matches!(state, Some("Z") | Some("X")) {
                return false;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        true
    }
}
