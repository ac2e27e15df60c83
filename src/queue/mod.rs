//! Where commands come from.

pub mod spool;

use std::path::PathBuf;

use thiserror::Error;

pub use spool::SpoolQueue;

/// The command source could not be reached; the loop restarts after a cooldown.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("queue directory {path} unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reading queued command {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An ordered multi-producer/single-consumer queue of text commands.
pub trait CommandSource {
    /// Number of commands waiting; never blocks.
    fn len(&mut self) -> Result<usize, TransportError>;

    /// Remove and return the oldest command, blocking until one arrives.
    fn pop(&mut self) -> Result<String, TransportError>;

    fn is_empty(&mut self) -> Result<bool, TransportError> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::io;

    use super::*;

    /// In-memory queue; each `fail_next` call makes the next access error once.
    #[derive(Debug, Default)]
    pub struct ScriptedQueue {
        pub pending: VecDeque<String>,
        failures: usize,
    }

    impl ScriptedQueue {
        pub fn push(&mut self, command: &str) {
            self.pending.push_back(command.to_string());
        }

        pub fn fail_next(&mut self) {
            self.failures += 1;
        }

        fn check(&mut self) -> Result<(), TransportError> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(TransportError::Unavailable {
                    path: PathBuf::from("scripted"),
                    source: io::Error::new(io::ErrorKind::ConnectionRefused, "scripted outage"),
                });
            }
            Ok(())
        }
    }

    impl CommandSource for ScriptedQueue {
        fn len(&mut self) -> Result<usize, TransportError> {
            self.check()?;
            Ok(self.pending.len())
        }

        fn pop(&mut self) -> Result<String, TransportError> {
            self.check()?;
            // Callers only pop after seeing a non-zero length.
            Ok(self.pending.pop_front().unwrap_or_default())
        }
    }
}
