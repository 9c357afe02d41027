//! Child process lifecycle: bounded wait and process-tree termination.
//!
//! Matchers are spawned as leaders of their own process group. Termination
//! kills every descendant reachable through parent pids (found by scanning
//! `/proc` on Linux, by asking `ps` on other unix systems) deepest first, then
//! the whole group, which also catches descendants orphaned by an exited
//! parent. On platforms without either mechanism only the direct child is
//! killed.
//!
//! A spawned group does not receive the terminal's Ctrl-C. Call
//! [`forward_interrupts`] once so an interrupted driver takes the running
//! matcher down with it.

use std::collections::HashMap;
use std::io;
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::sync::atomic::{AtomicI32, Ordering};

const POLL_START: Duration = Duration::from_millis(5);
const POLL_MAX: Duration = Duration::from_millis(100);

/// Process group of the matcher currently running, 0 when none.
#[cfg(unix)]
static ACTIVE_GROUP: AtomicI32 = AtomicI32::new(0);

/// Spawn `command` as the leader of a new process group.
pub fn spawn_in_group(command: &mut Command) -> io::Result<Child> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let child = command.spawn()?;
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            ACTIVE_GROUP.store(pgid, Ordering::SeqCst);
        }
    }
    Ok(child)
}

/// Wait for `child` to exit, giving up after `timeout`.
///
/// Returns `Ok(None)` when the deadline passes with the child still running.
/// A timeout too large to represent as an instant never expires.
pub fn wait_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now().checked_add(timeout);
    let mut interval = POLL_START;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let mut nap = interval;
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            nap = nap.min(deadline - now);
        }
        thread::sleep(nap);
        interval = (interval * 2).min(POLL_MAX);
    }
}

/// Kill `child` and every process it spawned, then reap it.
pub fn kill_tree(child: &mut Child) {
    let pid = child.id();
    let descendants = descendants_of(pid);
    if !descendants.is_empty() {
        tracing::debug!("Killing {} descendant(s) of pid {}", descendants.len(), pid);
    }
    // Deepest first so no process gets the chance to respawn a reaped child
    for &descendant in descendants.iter().rev() {
        kill_pid(descendant);
    }
    // The leader is not reaped yet, so its pid still names the group
    if is_group_leader(pid) {
        kill_group(pid);
    }

    if let Err(e) = child.kill() {
        // InvalidInput means the child already exited
        if e.kind() != io::ErrorKind::InvalidInput {
            tracing::warn!("Failed to kill pid {}: {}", pid, e);
        }
    }
    if let Err(e) = child.wait() {
        tracing::warn!("Failed to reap pid {}: {}", pid, e);
    }
}

/// Kill whatever is left of the process group led by `pgid`.
///
/// Only call this for groups created by [`spawn_in_group`].
#[cfg(unix)]
pub fn kill_group(pgid: u32) {
    let Ok(raw) = libc::pid_t::try_from(pgid) else {
        return;
    };
    if raw <= 1 {
        return;
    }
    let _ = ACTIVE_GROUP.compare_exchange(raw, 0, Ordering::SeqCst, Ordering::SeqCst);
    // SAFETY: killpg(2) has no memory-safety preconditions
    let ret = unsafe { libc::killpg(raw, libc::SIGKILL) };
    if ret != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!("Failed to kill process group {}: {}", pgid, err);
        }
    }
}

#[cfg(not(unix))]
pub fn kill_group(pgid: u32) {
    tracing::debug!("Cannot kill process group {} on this platform", pgid);
}

#[cfg(unix)]
fn is_group_leader(pid: u32) -> bool {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: getpgid(2) has no memory-safety preconditions
    unsafe { libc::getpgid(raw) == raw }
}

#[cfg(not(unix))]
fn is_group_leader(_pid: u32) -> bool {
    false
}

/// Make SIGINT and SIGTERM kill the running matcher group before the
/// driver itself terminates with the default action.
#[cfg(unix)]
pub fn forward_interrupts() {
    static INSTALL: std::sync::Once = std::sync::Once::new();
    INSTALL.call_once(|| {
        let handler = on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
        for signal in [libc::SIGINT, libc::SIGTERM] {
            // SAFETY: the handler only calls async-signal-safe functions
            if unsafe { libc::signal(signal, handler) } == libc::SIG_ERR {
                tracing::warn!("Failed to install handler for signal {}", signal);
            }
        }
    });
}

#[cfg(not(unix))]
pub fn forward_interrupts() {}

#[cfg(unix)]
extern "C" fn on_interrupt(signal: libc::c_int) {
    let pgid = ACTIVE_GROUP.load(Ordering::SeqCst);
    // SAFETY: killpg, signal and raise are async-signal-safe
    unsafe {
        if pgid > 1 {
            libc::killpg(pgid, libc::SIGKILL);
        }
        libc::signal(signal, libc::SIG_DFL);
        libc::raise(signal);
    }
}

/// All descendants of `root`, every parent listed before its children.
pub fn descendants_of(root: u32) -> Vec<u32> {
    let children = child_table();
    let mut result = Vec::new();
    let mut frontier = vec![root];
    while let Some(parent) = frontier.pop() {
        if let Some(kids) = children.get(&parent) {
            for &kid in kids {
                if kid != root && !result.contains(&kid) {
                    result.push(kid);
                    frontier.push(kid);
                }
            }
        }
    }
    result
}

/// Map from parent pid to child pids for every visible process.
fn child_table() -> HashMap<u32, Vec<u32>> {
    let mut table: HashMap<u32, Vec<u32>> = HashMap::new();
    for (pid, ppid) in process_list() {
        table.entry(ppid).or_default().push(pid);
    }
    table
}

#[cfg(target_os = "linux")]
fn process_list() -> Vec<(u32, u32)> {
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
        .filter_map(|pid| {
            let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
            Some((pid, parse_stat_ppid(&stat)?))
        })
        .collect()
}

#[cfg(all(unix, not(target_os = "linux")))]
fn process_list() -> Vec<(u32, u32)> {
    let output = match std::process::Command::new("ps")
        .args(["-A", "-o", "pid=", "-o", "ppid="])
        .output()
    {
        Ok(output) if output.status.success() => output,
        Ok(_) | Err(_) => return Vec::new(),
    };
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let pid = fields.next()?.parse().ok()?;
            let ppid = fields.next()?.parse().ok()?;
            Some((pid, ppid))
        })
        .collect()
}

#[cfg(not(unix))]
fn process_list() -> Vec<(u32, u32)> {
    Vec::new()
}

/// Parent pid from the contents of `/proc/<pid>/stat`.
///
/// The command name is parenthesized and may itself contain spaces or
/// parentheses, so fields are counted from the last `)`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_stat_ppid(stat: &str) -> Option<u32> {
    let rest = &stat[stat.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    let _state = fields.next()?;
    fields.next()?.parse().ok()
}

#[cfg(unix)]
fn kill_pid(pid: u32) {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety preconditions
    let ret = unsafe { libc::kill(raw, libc::SIGKILL) };
    if ret != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!("Failed to kill pid {}: {}", pid, err);
        }
    }
}

#[cfg(not(unix))]
fn kill_pid(pid: u32) {
    tracing::debug!("Cannot kill descendant pid {} on this platform", pid);
}
