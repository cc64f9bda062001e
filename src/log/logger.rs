use crate::{
    config::Config,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, TrySendError},
    thread::{self, JoinHandle},
    time::{SystemTime, UNIX_EPOCH},
};

/// Flush every 100 lines when debugging so crashes leave a useful tail.
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 100;

/// Flush every 1000 lines otherwise.
#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

const DEFAULT_APP_NAME: &str = "meshcall";

/// Bounded, non-blocking logger writing to one file per process.
///
/// Producers enqueue through `LoggerHandle`; a `logger-worker` thread drains
/// the queue into the file and forwards a sample of lines (all warnings and
/// errors, one in `sample_every` of the rest) to a small UI channel.
pub struct Logger {
    handle: LoggerHandle,
    ui_log_rx: Receiver<String>,
    thread: Option<JoinHandle<()>>,
    file_path: PathBuf,
}

impl Logger {
    /// Starts the logger using the `[Logging]` section of `config`
    /// (`log_path`, `log_filename`). Without `log_path` the file goes to a
    /// `logs/` directory next to the executable.
    #[must_use]
    pub fn start(cap: usize, ui_cap: usize, sample_every: u32, config: &Config) -> Self {
        let app_name = config
            .get_non_empty("Logging", "log_filename")
            .unwrap_or(DEFAULT_APP_NAME);

        let dir = config.get_non_empty("Logging", "log_path").map_or_else(
            || exe_dir_fallback_cwd().join("logs"),
            expand_path,
        );
        Self::start_in_dir(dir, app_name, cap, ui_cap, sample_every)
    }

    /// Starts the logger in `dir`, creating it if needed. The file is named
    /// `<app_name>-<YYYYMMDD_HHMMSS>-pid<pid>.log`.
    pub fn start_in_dir<D: AsRef<Path>>(
        dir: D,
        app_name: &str,
        cap: usize,
        ui_cap: usize,
        sample_every: u32,
    ) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let _ = fs::create_dir_all(&dir);

        let sample_every = sample_every.max(1);
        let file_path = dir.join(format!(
            "{app_name}-{}-pid{}.log",
            timestamp_for_filename(),
            std::process::id()
        ));

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap);
        let (ui_tx, ui_rx) = mpsc::sync_channel::<String>(ui_cap);

        let worker_path = file_path.clone();
        let thread = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || run_writer(&worker_path, &rx, &ui_tx, sample_every))
            .ok();

        Self {
            handle: LoggerHandle { tx },
            ui_log_rx: ui_rx,
            thread,
            file_path,
        }
    }

    /// Enqueues a line without blocking.
    ///
    /// # Errors
    /// Returns the rejected message when the queue is full or the writer is gone.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), TrySendError<LogMsg>> {
        self.handle.try_log(level, text, target)
    }

    /// Cloneable sink for handing to components.
    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    /// One sampled line for a UI, if any is waiting.
    #[must_use]
    pub fn try_recv_ui(&self) -> Option<String> {
        self.ui_log_rx.try_recv().ok()
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Closes the queue and waits for the writer to flush.
    ///
    /// Lines sent through handles cloned earlier keep the queue alive; the
    /// writer only exits once every handle is dropped.
    pub fn shutdown(mut self) {
        let Self { handle, thread, .. } = &mut self;
        let (dead_tx, _) = mpsc::sync_channel(1);
        drop(std::mem::replace(handle, LoggerHandle { tx: dead_tx }));
        if let Some(t) = thread.take() {
            let _ = t.join();
        }
    }
}

fn run_writer(
    path: &Path,
    rx: &Receiver<LogMsg>,
    ui_tx: &mpsc::SyncSender<String>,
    sample_every: u32,
) {
    // Target file, then a temp file, then nowhere. Never panic.
    let writer: Box<dyn Write + Send> =
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Box::new(f),
            Err(_) => {
                let fallback = std::env::temp_dir().join("meshcall-fallback.log");
                match OpenOptions::new().create(true).append(true).open(fallback) {
                    Ok(f) => Box::new(f),
                    Err(_) => Box::new(io::sink()),
                }
            }
        };
    let mut out = BufWriter::new(writer);

    let mut sampled: u32 = 0;
    let mut lines_written: u32 = 0;
    let mut dropped_to_ui: usize = 0;

    while let Ok(m) = rx.recv() {
        let _ = writeln!(&mut out, "{}", m.render());
        lines_written = lines_written.wrapping_add(1);
        if lines_written.is_multiple_of(FLUSH_BATCH_SIZE) {
            let _ = out.flush();
        }

        let forward = matches!(m.level, LogLevel::Warn | LogLevel::Error) || {
            sampled = sampled.wrapping_add(1);
            sampled.is_multiple_of(sample_every)
        };
        if forward
            && ui_tx
                .try_send(format!("[{}] {}", m.level.as_str(), m.text))
                .is_err()
        {
            dropped_to_ui += 1;
        }
        if dropped_to_ui >= 10 {
            let _ = ui_tx.try_send(format!(
                "(logger) UI log queue dropped {dropped_to_ui} lines"
            ));
            dropped_to_ui = 0;
        }
    }

    let _ = out.flush();
}

/// Directory of the running executable, or the working directory.
fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// `YYYYMMDD_HHMMSS` in UTC, or `unix_<secs>` if the date cannot be represented.
fn timestamp_for_filename() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    civil_from_unix(secs).map_or_else(
        || format!("unix_{secs}"),
        |(y, mo, d, h, mi, s)| format!("{y:04}{mo:02}{d:02}_{h:02}{mi:02}{s:02}"),
    )
}

/// Days-from-civil inverse (proleptic Gregorian), to avoid pulling in a date crate.
#[allow(clippy::many_single_char_names)]
fn civil_from_unix(secs: u64) -> Option<(i32, u32, u32, u32, u32, u32)> {
    let sec = u32::try_from(secs % 60).ok()?;
    let min = u32::try_from((secs / 60) % 60).ok()?;
    let hour = u32::try_from((secs / 3_600) % 24).ok()?;

    let z = i128::from(secs / 86_400) + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + i128::from(m <= 2);

    Some((
        i32::try_from(y).ok()?,
        u32::try_from(m).ok()?,
        u32::try_from(d).ok()?,
        hour,
        min,
        sec,
    ))
}

/// Expands a leading `~` to the home directory.
fn expand_path(path_str: &str) -> PathBuf {
    let home = || {
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from)
    };
    if path_str == "~" {
        if let Some(h) = home() {
            return h;
        }
    }
    if let Some(rest) = path_str
        .strip_prefix("~/")
        .or_else(|| path_str.strip_prefix("~\\"))
    {
        if let Some(h) = home() {
            return h.join(rest);
        }
    }
    PathBuf::from(path_str)
}
