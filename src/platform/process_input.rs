//! Process stdin as an [`InputStream`].
//!
//! Resuming puts the terminal into raw mode (when stdin is a TTY and raw mode
//! is enabled), starts a reader thread that feeds a [`Chunker`], and routes
//! SIGINT/SIGTERM to the interrupt chunk. Chunks reach the owning thread over
//! an `mpsc` channel.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use libc::{self, c_int};
use signal_hook::iterator::{Handle, Signals};

use crate::config::EnvConfig;
use crate::core::keycodes::INTERRUPT;
use crate::platform::chunker::Chunker;
use crate::platform::input_stream::InputStream;

const READ_BUFFER_LEN: usize = 4096;
const IDLE_POLL_MS: i32 = 50;

fn is_tty(fd: c_int) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Idle,
    Readable,
    Closed,
}

/// Hang-up and error wake the reader too, so the following `read` observes
/// end of file instead of the loop spinning on `poll`.
fn poll_readable(fd: c_int, timeout_ms: i32) -> Readiness {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    if result <= 0 {
        Readiness::Idle
    } else if fds.revents & libc::POLLNVAL != 0 {
        Readiness::Closed
    } else if fds.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0 {
        Readiness::Readable
    } else {
        Readiness::Idle
    }
}

fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub struct ProcessInput {
    stdin_fd: c_int,
    raw_mode: bool,
    original_termios: Option<libc::termios>,
    warned_no_raw: bool,
    active: bool,
    stop_flag: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    signal_handle: Option<Handle>,
    signal_thread: Option<JoinHandle<()>>,
    sender: Sender<String>,
    receiver: Receiver<String>,
}

impl ProcessInput {
    pub fn new(config: &EnvConfig) -> Self {
        Self::with_fd(libc::STDIN_FILENO, config.raw_mode)
    }

    pub fn with_fd(stdin_fd: c_int, raw_mode: bool) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            stdin_fd,
            raw_mode,
            original_termios: None,
            warned_no_raw: false,
            active: false,
            stop_flag: Arc::new(AtomicBool::new(false)),
            reader: None,
            signal_handle: None,
            signal_thread: None,
            sender,
            receiver,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.original_termios.is_some()
    }

    fn warn_no_raw_once(&mut self, reason: &str) {
        if !self.warned_no_raw {
            self.warned_no_raw = true;
            tracing::warn!(reason, "raw mode unavailable; keys arrive line-buffered");
        }
    }

    fn enable_raw_mode(&mut self) {
        if !self.raw_mode {
            return;
        }
        if !is_tty(self.stdin_fd) {
            self.warn_no_raw_once("stdin is not a TTY");
            return;
        }
        let result = get_termios(self.stdin_fd).and_then(|original| {
            let mut raw = original;
            unsafe {
                libc::cfmakeraw(&mut raw);
            }
            set_termios(self.stdin_fd, &raw).map(|()| original)
        });
        match result {
            Ok(original) => self.original_termios = Some(original),
            Err(err) => self.warn_no_raw_once(&err.to_string()),
        }
    }

    fn restore_raw_mode(&mut self) {
        if let Some(original) = self.original_termios.take() {
            // Drop unread bytes so they do not leak to the shell.
            unsafe {
                libc::tcflush(self.stdin_fd, libc::TCIFLUSH);
            }
            if let Err(err) = set_termios(self.stdin_fd, &original) {
                tracing::warn!(error = %err, "failed to restore terminal mode");
            }
        }
    }

    fn start_reader(&mut self) {
        let stdin_fd = self.stdin_fd;
        let stop_flag = Arc::clone(&self.stop_flag);
        let sender = self.sender.clone();

        self.reader = Some(thread::spawn(move || {
            let mut buffer = [0u8; READ_BUFFER_LEN];
            let mut chunker = Chunker::default();

            let mut eof = false;
            while !eof && !stop_flag.load(Ordering::SeqCst) {
                let now = Instant::now();
                let timeout = chunker.poll_timeout_ms(now, IDLE_POLL_MS);
                let chunks = match poll_readable(stdin_fd, timeout) {
                    Readiness::Idle => chunker.flush_due(now),
                    Readiness::Closed => {
                        eof = true;
                        chunker.flush()
                    }
                    Readiness::Readable => {
                        let read_len = unsafe {
                            libc::read(stdin_fd, buffer.as_mut_ptr() as *mut _, buffer.len())
                        };
                        match read_len {
                            0 => {
                                eof = true;
                                chunker.flush()
                            }
                            len if len < 0 => {
                                let err = io::Error::last_os_error();
                                if !matches!(
                                    err.kind(),
                                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                                ) {
                                    tracing::warn!(error = %err, "stdin read failed");
                                    eof = true;
                                }
                                chunker.flush()
                            }
                            len => chunker.feed(&buffer[..len as usize]),
                        }
                    }
                };

                for chunk in chunks {
                    if sender.send(chunk).is_err() {
                        return;
                    }
                }
            }
            if eof {
                tracing::debug!("stdin reached end of file");
            }
        }));
    }

    /// Whether the reader thread has stopped on its own (end of file or a
    /// closed descriptor) while the stream is still active.
    pub fn reader_finished(&self) -> bool {
        self.reader.as_ref().is_some_and(JoinHandle::is_finished)
    }

    fn start_signal_thread(&mut self) {
        let mut signals = match Signals::new([libc::SIGINT, libc::SIGTERM]) {
            Ok(signals) => signals,
            Err(err) => {
                tracing::warn!(error = %err, "failed to register interrupt signals");
                return;
            }
        };
        self.signal_handle = Some(signals.handle());
        let sender = self.sender.clone();
        self.signal_thread = Some(thread::spawn(move || {
            for _ in signals.forever() {
                if sender.send(INTERRUPT.to_string()).is_err() {
                    return;
                }
            }
        }));
    }

    fn stop_threads(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.signal_handle.take() {
            handle.close();
        }
        if let Some(handle) = self.signal_thread.take() {
            let _ = handle.join();
        }
    }
}

impl InputStream for ProcessInput {
    fn resume(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        self.enable_raw_mode();
        self.stop_flag.store(false, Ordering::SeqCst);
        self.start_signal_thread();
        self.start_reader();
        self.active = true;
        Ok(())
    }

    fn pause(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.stop_threads();
        self.restore_raw_mode();
        while self.receiver.try_recv().is_ok() {}
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn try_next_chunk(&mut self) -> Option<String> {
        if !self.active {
            return None;
        }
        self.receiver.try_recv().ok()
    }

    fn next_chunk_timeout(&mut self, timeout: Duration) -> Option<String> {
        if !self.active {
            return None;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(chunk) => Some(chunk),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for ProcessInput {
    fn drop(&mut self) {
        self.pause();
    }
}
