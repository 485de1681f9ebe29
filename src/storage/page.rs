//! Typed, fixed-offset access to a single page buffer (C1).
//!
//! A `Page` is a raw 4096-byte buffer with no semantic interpretation of its
//! own; node views (see `node.rs`) layer meaning on top of it. Every
//! multi-byte integer is little-endian, matching the file format (§6 of the
//! spec) rather than the source's native byte order.

/// Page size in bytes. 4 KiB mirrors the page size used by the virtual
/// memory systems of most architectures.
pub const PAGE_SIZE: usize = 4096;

/// A single resident page buffer.
#[derive(Clone)]
pub struct Page {
    pub(crate) data: [u8; PAGE_SIZE],
}

impl Page {
    /// A freshly zeroed page, as materialized for a page number beyond the
    /// end of the file.
    pub fn zeroed() -> Self {
        Page {
            data: [0u8; PAGE_SIZE],
        }
    }

    pub fn from_bytes(buf: [u8; PAGE_SIZE]) -> Self {
        Page { data: buf }
    }

    pub fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub fn read_u8(&self, offset: usize) -> u8 {
        self.data[offset]
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) {
        self.data[offset] = value;
    }

    pub fn read_u32(&self, offset: usize) -> u32 {
        let bytes: [u8; 4] = self.data[offset..offset + 4]
            .try_into()
            .expect("page read_u32: offset out of range");
        u32::from_le_bytes(bytes)
    }

    pub fn write_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Copies a whole cell-sized (or any same-sized) region from one offset
    /// to another within the same page. Used by the mutator when shifting
    /// cells to make or close a gap.
    pub fn copy_within(&mut self, src_offset: usize, dst_offset: usize, len: usize) {
        self.data
            .copy_within(src_offset..src_offset + len, dst_offset);
    }
}
