//! Splits raw stdin reads into one chunk per keystroke.
//!
//! A single `read` may carry several keys (fast typing, key repeat) or only
//! part of an escape sequence. The register decodes whole chunks, so bytes
//! are regrouped here: CSI and SS3 sequences are held until complete, a lone
//! ESC is held until the flush timeout, and bracketed paste is delivered as
//! one literal chunk.

use std::time::{Duration, Instant};

use unicode_segmentation::UnicodeSegmentation;

const ESC: char = '\x1b';
const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";

/// Default wait before a dangling escape prefix is flushed verbatim.
pub const DEFAULT_ESC_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Complete(usize),
    Incomplete,
}

#[derive(Debug)]
pub struct Chunker {
    pending: String,
    utf8_tail: Vec<u8>,
    paste: Option<String>,
    timeout: Duration,
    deadline: Option<Instant>,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_ESC_TIMEOUT)
    }
}

impl Chunker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: String::new(),
            utf8_tail: Vec::new(),
            paste: None,
            timeout,
            deadline: None,
        }
    }

    /// Feed one read's worth of bytes and return every chunk it completes.
    /// A multi-byte character split across reads is held until its last byte
    /// arrives.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.deadline = None;
        self.decode_utf8(bytes);

        let mut chunks = Vec::new();
        self.drain(&mut chunks);

        if !self.pending.is_empty() || !self.utf8_tail.is_empty() {
            self.deadline = Some(Instant::now() + self.timeout);
        }
        chunks
    }

    /// Flush a held prefix once its deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    /// Emit whatever is held, complete or not.
    pub fn flush(&mut self) -> Vec<String> {
        self.deadline = None;
        if !self.utf8_tail.is_empty() {
            let tail = std::mem::take(&mut self.utf8_tail);
            self.pending.push_str(&String::from_utf8_lossy(&tail));
        }
        if self.pending.is_empty() {
            return Vec::new();
        }
        vec![std::mem::take(&mut self.pending)]
    }

    /// Poll timeout for the reader loop, shortened while a prefix is held.
    pub fn poll_timeout_ms(&self, now: Instant, idle_ms: i32) -> i32 {
        match self.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(now);
                let ms = remaining.as_millis().min(i32::MAX as u128) as i32;
                ms.min(idle_ms).max(0)
            }
            None => idle_ms,
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.utf8_tail.clear();
        self.paste = None;
        self.deadline = None;
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn in_paste(&self) -> bool {
        self.paste.is_some()
    }

    /// Append `bytes` to `pending`, replacing invalid sequences and holding
    /// back an incomplete trailing character.
    fn decode_utf8(&mut self, bytes: &[u8]) {
        let mut data = std::mem::take(&mut self.utf8_tail);
        data.extend_from_slice(bytes);

        let mut rest = data.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.pending.push_str(valid);
                    return;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    self.pending.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            self.pending.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.utf8_tail = after.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn drain(&mut self, chunks: &mut Vec<String>) {
        loop {
            if let Some(paste) = self.paste.as_mut() {
                paste.push_str(&self.pending);
                self.pending.clear();
                let Some(end) = paste.find(PASTE_END) else {
                    return;
                };
                let rest = paste[end + PASTE_END.len()..].to_string();
                paste.truncate(end);
                if let Some(content) = self.paste.take().filter(|content| !content.is_empty()) {
                    chunks.push(content);
                }
                self.pending = rest;
                continue;
            }

            if let Some(start) = self.pending.find(PASTE_START) {
                let before = self.pending[..start].to_string();
                let after = self.pending[start + PASTE_START.len()..].to_string();
                let tail = split_complete(&before, chunks);
                // A held prefix before the paste marker can no longer complete.
                if !tail.is_empty() {
                    chunks.push(tail.to_string());
                }
                self.paste = Some(String::new());
                self.pending = after;
                continue;
            }

            let held = split_complete(&self.pending, chunks).to_string();
            self.pending = held;
            return;
        }
    }
}

/// Push every complete chunk of `data` and return the incomplete tail.
fn split_complete<'a>(data: &'a str, chunks: &mut Vec<String>) -> &'a str {
    let mut pos = 0;
    while pos < data.len() {
        let rest = &data[pos..];
        if rest.starts_with(ESC) {
            match scan_escape(rest) {
                Scan::Complete(len) => {
                    chunks.push(rest[..len].to_string());
                    pos += len;
                }
                Scan::Incomplete => return rest,
            }
            continue;
        }

        let run_end = rest.find(ESC).unwrap_or(rest.len());
        for grapheme in rest[..run_end].graphemes(true) {
            if grapheme == "\r\n" {
                chunks.push("\r".to_string());
                chunks.push("\n".to_string());
            } else {
                chunks.push(grapheme.to_string());
            }
        }
        pos += run_end;
    }
    ""
}

fn scan_escape(data: &str) -> Scan {
    let mut chars = data.char_indices().skip(1);
    let Some((_, introducer)) = chars.next() else {
        return Scan::Incomplete;
    };

    match introducer {
        '[' => {
            for (idx, ch) in chars {
                if ('\x40'..='\x7e').contains(&ch) {
                    return Scan::Complete(idx + ch.len_utf8());
                }
            }
            Scan::Incomplete
        }
        'O' => match chars.next() {
            Some((idx, ch)) => Scan::Complete(idx + ch.len_utf8()),
            None => Scan::Incomplete,
        },
        // ESC ESC: the first one stands alone.
        ESC => Scan::Complete(1),
        other => Scan::Complete(1 + other.len_utf8()),
    }
}
