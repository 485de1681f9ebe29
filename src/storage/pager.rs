//! The pager (C2): owns the file handle and a bounded directory of resident
//! page buffers.
//!
//! Capacity is a hard cap, not a cache — there is no eviction. Once
//! `TABLE_MAX_PAGES` slots are occupied, a further `get_page` against an
//! unoccupied slot number fails rather than reclaiming one.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use heapless::Vec as HVec;
use tracing::{debug, instrument};

use crate::err;
use crate::errors::Error;

use super::page::{Page, PAGE_SIZE};

/// Hard cap on resident pages. Matches the classic tutorial's in-memory
/// table ceiling; this engine has no buffer replacement policy.
pub const TABLE_MAX_PAGES: usize = 100;

pub struct Pager {
    file: File,
    file_length: u64,
    num_pages: u32,
    pages: HVec<Option<Box<Page>>, TABLE_MAX_PAGES>,
}

impl Pager {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| err!(IoOpen, "{}: {}", path.display(), e))?;

        let file_length = file
            .metadata()
            .map_err(|e| err!(IoOpen, "{}: {}", path.display(), e))?
            .len();

        if file_length % (PAGE_SIZE as u64) != 0 {
            return Err(err!(CorruptPageAlignment));
        }

        let num_pages = (file_length / PAGE_SIZE as u64) as u32;
        let mut pages = HVec::new();
        for _ in 0..TABLE_MAX_PAGES {
            pages
                .push(None)
                .unwrap_or_else(|_| unreachable!("directory sized to TABLE_MAX_PAGES"));
        }

        debug!(num_pages, file_length, "pager opened");

        Ok(Pager {
            file,
            file_length,
            num_pages,
            pages,
        })
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Returns `num_pages` without materializing a buffer; the caller's next
    /// `get_page` against the returned number allocates it.
    pub fn allocate_page(&self) -> u32 {
        self.num_pages
    }

    #[instrument(skip(self))]
    pub fn get_page(&mut self, n: u32) -> Result<&mut Page, Error> {
        if n as usize >= TABLE_MAX_PAGES {
            return Err(Error::PageIndexOutOfRange(n));
        }

        if self.pages[n as usize].is_none() {
            let mut page = Page::zeroed();
            if n < self.num_pages {
                self.file
                    .seek(SeekFrom::Start(n as u64 * PAGE_SIZE as u64))
                    .map_err(|e| err!(IoSeek, "{}", e))?;
                let mut buf = [0u8; PAGE_SIZE];
                self.file
                    .read_exact(&mut buf)
                    .map_err(|e| err!(IoRead, "{}", e))?;
                page = Page::from_bytes(buf);
            }
            self.pages[n as usize] = Some(Box::new(page));
            if n + 1 > self.num_pages {
                self.num_pages = n + 1;
            }
        }

        Ok(self.pages[n as usize].as_mut().unwrap())
    }

    #[instrument(skip(self))]
    pub fn flush(&mut self, n: u32) -> Result<(), Error> {
        let page = self.pages[n as usize]
            .as_ref()
            .unwrap_or_else(|| panic!("flush of vacant page slot {}", n));

        self.file
            .seek(SeekFrom::Start(n as u64 * PAGE_SIZE as u64))
            .map_err(|e| err!(IoSeek, "{}", e))?;
        self.file
            .write_all(page.as_bytes())
            .map_err(|e| err!(IoWrite, "page {}: {}", n, e))?;

        let end = (n as u64 + 1) * PAGE_SIZE as u64;
        if end > self.file_length {
            self.file_length = end;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn close(&mut self) -> Result<(), Error> {
        for n in 0..self.num_pages {
            if self.pages[n as usize].is_some() {
                self.flush(n)?;
            }
        }
        self.file.flush().map_err(|e| err!(IoWrite, "{}", e))?;
        for slot in self.pages.iter_mut() {
            *slot = None;
        }
        Ok(())
    }
}
