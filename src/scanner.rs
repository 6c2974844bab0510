//! Rolling start-code scanner over a seekable byte channel.
//!
//! The window holds the last four bytes read: the `00 00 01` prefix plus the
//! marker's discriminant once a start code is lined up. Bytes leave the
//! window oldest first, so a segment copied by [`MarkerScanner::read_to_next_marker`]
//! starts at the current marker and stops right before the next one, which
//! stays pending in the window for the following scan step.

use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

use bytes::{BufMut, BytesMut};

use crate::constants::is_start_code;

const EMPTY_WINDOW: u32 = u32::MAX;

pub struct MarkerScanner<R> {
    inner: R,
    chunk: Vec<u8>,
    chunk_pos: usize,
    chunk_len: usize,
    window: u32,
    /// Valid bytes in `window` (0..=4)
    fill: u8,
    /// Channel offset just past the newest window byte
    consumed: u64,
    done: bool,
}

impl<R: Read + Seek> MarkerScanner<R> {
    /// Starts scanning at the channel's current position
    pub fn new(mut inner: R, fetch_size: usize) -> io::Result<Self> {
        let consumed = inner.stream_position()?;
        let mut scanner = Self {
            inner,
            chunk: vec![0; fetch_size.max(1)],
            chunk_pos: 0,
            chunk_len: 0,
            window: EMPTY_WINDOW,
            fill: 0,
            consumed,
            done: false,
        };
        scanner.prime()?;
        Ok(scanner)
    }

    /// Current window value, a start code only when `00 00 01 xx` is lined up
    pub fn marker(&self) -> u32 {
        self.window
    }

    /// Channel offset of the oldest window byte, i.e. of the current marker
    pub fn pos(&self) -> u64 {
        self.consumed - u64::from(self.fill)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advances until the window holds a start code. Returns false at end of stream.
    pub fn skip_to_marker(&mut self) -> io::Result<bool> {
        if self.done {
            return Ok(false);
        }
        while let Some(byte) = self.fetch()? {
            self.shift(byte);
            if is_start_code(self.window) {
                return Ok(true);
            }
        }
        self.window = EMPTY_WINDOW;
        self.fill = 0;
        self.done = true;
        Ok(false)
    }

    /// Copies the current marker and everything after it into `out`, stopping
    /// as soon as the window lines up on the next start code.
    ///
    /// Returns false at end of stream (the tail is flushed into `out`) or when
    /// `out` reached `limit` bytes.
    pub fn read_to_next_marker(&mut self, out: &mut BytesMut, limit: usize) -> io::Result<bool> {
        if self.done {
            return Ok(false);
        }
        loop {
            if out.len() >= limit {
                return Ok(false);
            }
            match self.fetch()? {
                Some(byte) => {
                    if let Some(evicted) = self.shift(byte) {
                        out.put_u8(evicted);
                    }
                    if is_start_code(self.window) {
                        return Ok(true);
                    }
                }
                None => {
                    self.flush(out, limit);
                    return Ok(false);
                }
            }
        }
    }

    /// Copies exactly `len` bytes into `out` regardless of markers
    pub fn read(&mut self, out: &mut BytesMut, len: usize, limit: usize) -> io::Result<bool> {
        if self.done {
            return Ok(false);
        }
        for _ in 0..len {
            if out.len() >= limit {
                return Ok(false);
            }
            match self.fetch()? {
                Some(byte) => {
                    if let Some(evicted) = self.shift(byte) {
                        out.put_u8(evicted);
                    }
                }
                None => {
                    self.flush(out, limit);
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Repositions the channel and restarts the window at `offset`
    pub fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.consumed = offset;
        self.chunk_pos = 0;
        self.chunk_len = 0;
        self.prime()
    }

    fn prime(&mut self) -> io::Result<()> {
        self.window = EMPTY_WINDOW;
        self.fill = 0;
        self.done = false;
        while self.fill < 4 {
            match self.fetch()? {
                Some(byte) => {
                    self.shift(byte);
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Pushes a byte into the window, returning the byte that fell out of it
    fn shift(&mut self, byte: u8) -> Option<u8> {
        let evicted = (self.fill == 4).then(|| (self.window >> 24) as u8);
        self.window = (self.window << 8) | u32::from(byte);
        self.fill = (self.fill + 1).min(4);
        evicted
    }

    /// Drains the window into `out` once the channel is exhausted
    fn flush(&mut self, out: &mut BytesMut, limit: usize) {
        for i in (0..self.fill).rev() {
            if out.len() >= limit {
                break;
            }
            out.put_u8((self.window >> (8 * u32::from(i))) as u8);
        }
        self.window = EMPTY_WINDOW;
        self.fill = 0;
        self.done = true;
    }

    fn fetch(&mut self) -> io::Result<Option<u8>> {
        if self.chunk_pos == self.chunk_len {
            let n = loop {
                match self.inner.read(&mut self.chunk) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            };
            if n == 0 {
                return Ok(None);
            }
            self.chunk_pos = 0;
            self.chunk_len = n;
        }
        let byte = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        self.consumed += 1;
        Ok(Some(byte))
    }
}
