//! Package manager lifecycle around an interrupted run
//!
//! `apt-get` holds `/var/lib/dpkg/lock-frontend` while it works, `dnf` and
//! `yum` hold the RPM transaction lock, `pacman` holds `/var/lib/pacman/db.lck`.
//! A package manager orphaned by Ctrl+C keeps that lock and blocks the next
//! run, so every command dockerboot spawns:
//!
//! - leads its own process group (dpkg and rpm scriptlets inherit it) and gets
//!   SIGTERM when dockerboot dies
//! - is tracked by PID and program name in a global registry
//! - is stopped group-wide on SIGINT/SIGTERM/SIGHUP or when the provisioning
//!   guard drops: SIGTERM, then SIGKILL once the grace period runs out
//!
//! A package manager that had to be killed may leave its lock or a half
//! configured package behind; the warning names the recovery command.

use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Time a package manager gets to finish its current transaction step when
/// the provisioning run ends with children still alive.
pub const GUARD_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Shorter grace after SIGINT/SIGTERM/SIGHUP; the user is waiting.
pub const SIGNAL_GRACE_PERIOD: Duration = Duration::from_secs(3);

static CHILD_REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// Running children, keyed by PID (which is also their process group ID)
#[derive(Debug, Default)]
pub struct ChildRegistry {
    children: HashMap<u32, String>,
    /// Set once; the signal thread and the guard may both try to clean up
    cleanup_initiated: bool,
}

impl ChildRegistry {
    /// Get or create the global child registry
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        CHILD_REGISTRY
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    /// Track a freshly spawned `program`.
    pub fn register(&mut self, pid: u32, program: &str) {
        tracing::trace!("Tracking {} (PID {})", program, pid);
        self.children.insert(pid, program.to_string());
    }

    pub fn unregister(&mut self, pid: u32) {
        if let Some(program) = self.children.remove(&pid) {
            tracing::trace!("{} (PID {}) exited", program, pid);
        }
    }

    pub fn count(&self) -> usize {
        self.children.len()
    }

    /// Program names of the tracked children, sorted.
    pub fn running_programs(&self) -> Vec<String> {
        let mut programs: Vec<String> = self.children.values().cloned().collect();
        programs.sort();
        programs
    }

    /// Stop every tracked process group: SIGTERM, wait up to `grace_period`,
    /// then SIGKILL whatever is left.
    pub fn terminate_all(&mut self, grace_period: Duration) {
        if self.cleanup_initiated {
            tracing::debug!("Child cleanup already running");
            return;
        }
        self.cleanup_initiated = true;

        if self.children.is_empty() {
            return;
        }

        tracing::info!("Stopping {}", self.running_programs().join(", "));

        let children: Vec<(u32, String)> = self.children.drain().collect();
        for (pid, program) in &children {
            if let Err(e) = send_signal_to_group(*pid, Signal::SIGTERM) {
                tracing::warn!("SIGTERM to {} group {} failed: {}", program, pid, e);
                if let Err(e2) = send_signal(*pid, Signal::SIGTERM) {
                    tracing::warn!("SIGTERM to {} (PID {}) failed: {}", program, pid, e2);
                }
            }
        }

        let start = Instant::now();
        while start.elapsed() < grace_period {
            if children.iter().all(|(pid, _)| !is_process_alive(*pid)) {
                tracing::info!("All package operations stopped cleanly");
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        for (pid, program) in &children {
            if !is_process_alive(*pid) {
                continue;
            }
            tracing::warn!(
                "{} (PID {}) ignored SIGTERM for {:?}, killing its process group",
                program,
                pid,
                grace_period
            );
            if let Err(e) = send_signal_to_group(*pid, Signal::SIGKILL) {
                tracing::error!("SIGKILL to {} group {} failed: {}", program, pid, e);
                let _ = send_signal(*pid, Signal::SIGKILL);
            }
            if let Some(hint) = lock_recovery_hint(program) {
                tracing::warn!(
                    "{} was killed mid-transaction; if the next run fails, {}",
                    program,
                    hint
                );
            }
        }
    }
}

/// What to run after `program` was killed while holding its lock.
pub fn lock_recovery_hint(program: &str) -> Option<&'static str> {
    let name = program.rsplit('/').next().unwrap_or(program);
    match name {
        "apt-get" | "apt" | "dpkg" => Some("run `dpkg --configure -a` as root"),
        "dnf" | "yum" | "rpm" => Some("run `rpm --rebuilddb` if rpm reports a locked database"),
        "pacman" => Some("remove /var/lib/pacman/db.lck if no pacman is running"),
        "zypper" => Some("remove /run/zypp.pid if no zypper is running"),
        "apk" => Some("run `apk fix`"),
        _ => None,
    }
}

fn pid_from(pid: u32) -> Pid {
    Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX))
}

fn send_signal(pid: u32, signal: Signal) -> Result<(), nix::Error> {
    signal::kill(pid_from(pid), signal)
}

/// Negative PID signals the whole group, so `apt-get`'s `dpkg` and the
/// maintainer scripts under it receive it too
fn send_signal_to_group(pgid: u32, signal: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(-pid_from(pgid).as_raw()), signal)
}

/// Check if a process is still alive (not dead or zombie)
fn is_process_alive(pid: u32) -> bool {
    if signal::kill(pid_from(pid), None).is_err() {
        return false;
    }

    // Field 3 of /proc/pid/stat is the state; Z and X are not running
    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        let fields: Vec<&str> = stat.split_whitespace().collect();
        if fields.len() > 2 {
            return !matches!(fields[2], "Z" | "X");
        }
    }

    true
}

/// Held for the duration of a provisioning run; stops leftover package
/// operations on drop (including an early return through `?`).
pub struct ProcessGuard {
    registry: Arc<Mutex<ChildRegistry>>,
}

impl ProcessGuard {
    pub fn new() -> Self {
        Self {
            registry: ChildRegistry::global(),
        }
    }

    pub fn child_count(&self) -> usize {
        self.registry.lock().map(|r| r.count()).unwrap_or(0)
    }
}

impl Default for ProcessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.terminate_all(GUARD_GRACE_PERIOD);
        }
    }
}

/// Install the SIGINT/SIGTERM/SIGHUP thread. Call once at program start.
///
/// The process exits with `128 + signal` after its children are stopped.
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            let signal_name = match sig {
                SIGINT => "SIGINT",
                SIGTERM => "SIGTERM",
                SIGHUP => "SIGHUP",
                _ => "UNKNOWN",
            };

            tracing::warn!("Received {}, stopping package operations", signal_name);

            if let Ok(mut registry) = ChildRegistry::global().lock() {
                registry.terminate_all(SIGNAL_GRACE_PERIOD);
            }

            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

/// Spawn a command as the leader of a new process group.
pub trait CommandProcessGroup {
    /// New process group, plus SIGTERM to the child if dockerboot dies first
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: the closure only calls async-signal-safe setpgid and prctl
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::other)?;

                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                    return Err(std::io::Error::last_os_error());
                }

                Ok(())
            });
        }
        self
    }
}
