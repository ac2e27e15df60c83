use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use super::{CommandSource, TransportError};

const COMMAND_EXT: &str = "cmd";
const TEMP_EXT: &str = "tmp";

/// Upper bound on how long `pop` sleeps between directory scans when no
/// filesystem event arrives.
const WAKE_TIMEOUT: Duration = Duration::from_millis(250);

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A durable FIFO backed by a spool directory.
///
/// Producers drop one `*.cmd` file per command; file names start with a
/// zero-padded enqueue timestamp so lexical order is arrival order.
///
/// The directory is created and watched on first use and again after it
/// disappears, so an unusable path surfaces as a [`TransportError`] from
/// `len`/`pop` rather than from `open`.
pub struct SpoolQueue {
    dir: PathBuf,
    connection: Option<Connection>,
}

struct Connection {
    wakeups: Option<Receiver<()>>,
    // Kept alive for as long as the connection; dropping it stops events.
    _watcher: Option<RecommendedWatcher>,
}

impl Connection {
    fn watch(dir: &Path) -> Self {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if res.is_ok() {
                let _ = tx.send(());
            }
        })
        .and_then(|mut watcher| {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
            Ok(watcher)
        });

        match watcher {
            Ok(watcher) => Self {
                wakeups: Some(rx),
                _watcher: Some(watcher),
            },
            Err(err) => {
                tracing::warn!(
                    "failed to watch queue dir {}: {err}; falling back to polling",
                    dir.display()
                );
                Self {
                    wakeups: None,
                    _watcher: None,
                }
            }
        }
    }
}

impl SpoolQueue {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            connection: None,
        }
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        if self.connection.is_some() {
            return Ok(());
        }

        fs::create_dir_all(&self.dir).map_err(|source| TransportError::Unavailable {
            path: self.dir.clone(),
            source,
        })?;
        self.connection = Some(Connection::watch(&self.dir));
        tracing::info!("queue dir {} ready", self.dir.display());
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Producer side: atomically add `command` to the spool at `dir`.
    pub fn enqueue(dir: &Path, command: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let stem = format!("{nanos:020}-{:08}-{seq:06}", std::process::id());

        let tmp = dir.join(format!("{stem}.{TEMP_EXT}"));
        let path = dir.join(format!("{stem}.{COMMAND_EXT}"));
        fs::write(&tmp, command.as_bytes())?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    fn pending(&mut self) -> Result<Vec<PathBuf>, TransportError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(source) => {
                self.connection = None;
                return Err(TransportError::Unavailable {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut pending: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == COMMAND_EXT))
            .collect();
        pending.sort();
        Ok(pending)
    }

    fn take(&self, path: &Path) -> Result<Option<String>, TransportError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(TransportError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        fs::remove_file(path).map_err(|source| TransportError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn wakeups(&self) -> Option<&Receiver<()>> {
        self.connection.as_ref().and_then(|c| c.wakeups.as_ref())
    }

    fn wait(&self) {
        match self.wakeups() {
            Some(rx) => {
                let _ = rx.recv_timeout(WAKE_TIMEOUT);
            }
            None => std::thread::sleep(WAKE_TIMEOUT),
        }
    }
}

impl CommandSource for SpoolQueue {
    fn len(&mut self) -> Result<usize, TransportError> {
        self.connect()?;
        Ok(self.pending()?.len())
    }

    fn pop(&mut self) -> Result<String, TransportError> {
        loop {
            self.connect()?;

            // Drain stale wakeups before scanning so none are lost.
            if let Some(rx) = self.wakeups() {
                while rx.try_recv().is_ok() {}
            }

            for path in self.pending()? {
                if let Some(command) = self.take(&path)? {
                    return Ok(command);
                }
            }

            self.wait();
        }
    }
}
