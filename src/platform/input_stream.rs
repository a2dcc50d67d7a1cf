//! Input stream abstraction and a scripted implementation for tests.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

/// Source of raw input chunks.
///
/// A paused stream delivers nothing; `resume` is idempotent.
pub trait InputStream {
    fn resume(&mut self) -> io::Result<()>;

    fn pause(&mut self);

    fn is_active(&self) -> bool;

    /// Next buffered chunk, without blocking.
    fn try_next_chunk(&mut self) -> Option<String>;

    /// Next chunk, waiting up to `timeout` for one to arrive.
    fn next_chunk_timeout(&mut self, _timeout: Duration) -> Option<String> {
        self.try_next_chunk()
    }
}

/// In-memory stream fed by the test or a replay script.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    chunks: VecDeque<String>,
    active: bool,
    resumes: usize,
    pauses: usize,
    fail_resume: Option<io::ErrorKind>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut input = Self::new();
        input.extend(chunks);
        input
    }

    pub fn push(&mut self, chunk: impl Into<String>) {
        self.chunks.push_back(chunk.into());
    }

    pub fn extend<I, S>(&mut self, chunks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chunks.extend(chunks.into_iter().map(Into::into));
    }

    /// Make every following `resume` fail with `kind`.
    pub fn fail_resume_with(&mut self, kind: io::ErrorKind) {
        self.fail_resume = Some(kind);
    }

    pub fn pending(&self) -> usize {
        self.chunks.len()
    }

    pub fn resume_count(&self) -> usize {
        self.resumes
    }

    pub fn pause_count(&self) -> usize {
        self.pauses
    }
}

impl InputStream for ScriptedInput {
    fn resume(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        self.resumes += 1;
        if let Some(kind) = self.fail_resume {
            return Err(io::Error::new(kind, "scripted resume failure"));
        }
        self.active = true;
        Ok(())
    }

    fn pause(&mut self) {
        if self.active {
            self.pauses += 1;
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn try_next_chunk(&mut self) -> Option<String> {
        if !self.active {
            return None;
        }
        self.chunks.pop_front()
    }
}
