//! Netlink attribute (TLV) builder and reader.
//!
//! Each attribute is a 4-byte header `{len: u16, type: u16}` followed by its
//! payload and padding to a 4-byte boundary. `len` counts the header and the
//! unpadded payload. A nest's payload is a run of attributes; its `len` is
//! only known once the last child is written, so [`AttrBuilder::open_nest`]
//! writes a placeholder that [`AttrBuilder::close_nest`] backpatches.
//!
//! ```text
//! offset  0        2        4
//!         ┌────────┬────────┬──────────────────────┬─────────┐
//!         │  len   │  type  │ payload              │ padding │
//!         └────────┴────────┴──────────────────────┴─────────┘
//! ```

use crate::error::{AttrError, NestingFault};
use crate::wire::consts::{NLA_F_NESTED, NLA_HDRLEN, NLA_TYPE_MASK, nla_align};

/// Identifies an open nest. Returned by [`AttrBuilder::open_nest`] and
/// consumed by [`AttrBuilder::close_nest`].
#[must_use = "every opened nest must be closed"]
#[derive(Debug, PartialEq, Eq)]
pub struct NestHandle {
    offset: usize,
}

impl NestHandle {
    /// Buffer offset of the nest's header.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Append-only attribute buffer with a stack of open nests.
///
/// The buffer never shrinks and a closed nest's header is never touched
/// again. [`finish`](Self::finish) refuses to hand out bytes while a nest
/// is open.
#[derive(Debug)]
pub struct AttrBuilder {
    buf: Vec<u8>,
    nests: Vec<usize>,
    limit: usize,
}

impl Default for AttrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AttrBuilder {
    /// An empty builder whose total size may reach `u16::MAX` bytes.
    pub fn new() -> Self {
        Self::with_limit(usize::from(u16::MAX))
    }

    /// An empty builder that rejects growth beyond `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(256),
            nests: Vec::new(),
            limit,
        }
    }

    /// Bytes written so far, padding included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of nests currently open.
    pub fn depth(&self) -> usize {
        self.nests.len()
    }

    /// Append a leaf attribute with a verbatim payload.
    pub fn put(&mut self, kind: u16, payload: &[u8]) -> Result<(), AttrError> {
        let len = NLA_HDRLEN + payload.len();
        if len > usize::from(u16::MAX) {
            return Err(AttrError::Oversized {
                kind: kind & NLA_TYPE_MASK,
                len,
                max: usize::from(u16::MAX),
            });
        }
        self.reserve(kind, nla_align(len))?;
        self.write_header(len as u16, kind);
        self.buf.extend_from_slice(payload);
        self.pad();
        Ok(())
    }

    /// Append a `u16` attribute in host byte order.
    pub fn put_u16(&mut self, kind: u16, value: u16) -> Result<(), AttrError> {
        self.put(kind, &value.to_ne_bytes())
    }

    /// Append a `u32` attribute in host byte order.
    pub fn put_u32(&mut self, kind: u16, value: u32) -> Result<(), AttrError> {
        self.put(kind, &value.to_ne_bytes())
    }

    /// Append a NUL-terminated string attribute.
    pub fn put_str(&mut self, kind: u16, value: &str) -> Result<(), AttrError> {
        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        self.put(kind, &payload)
    }

    /// Open a nest: write a placeholder header and push its offset.
    pub fn open_nest(&mut self, kind: u16) -> Result<NestHandle, AttrError> {
        self.reserve(kind, NLA_HDRLEN)?;
        let offset = self.buf.len();
        self.write_header(0, kind | NLA_F_NESTED);
        self.nests.push(offset);
        Ok(NestHandle { offset })
    }

    /// Close the innermost nest and backpatch its length.
    ///
    /// `handle` must belong to the innermost open nest; anything else is an
    /// [`AttrError::UnbalancedNesting`] and leaves the builder unchanged.
    pub fn close_nest(&mut self, handle: NestHandle) -> Result<(), AttrError> {
        let Some(&innermost) = self.nests.last() else {
            return Err(AttrError::UnbalancedNesting(NestingFault::NotOpen {
                closing: handle.offset,
            }));
        };
        if innermost != handle.offset {
            let fault = if self.nests.contains(&handle.offset) {
                NestingFault::OutOfOrder {
                    closing: handle.offset,
                    innermost,
                }
            } else {
                NestingFault::NotOpen {
                    closing: handle.offset,
                }
            };
            return Err(AttrError::UnbalancedNesting(fault));
        }

        let len = self.buf.len() - handle.offset;
        if len > usize::from(u16::MAX) {
            let kind = self.kind_at(handle.offset);
            return Err(AttrError::Oversized {
                kind,
                len,
                max: usize::from(u16::MAX),
            });
        }
        self.nests.pop();
        self.buf[handle.offset..handle.offset + 2].copy_from_slice(&(len as u16).to_ne_bytes());
        Ok(())
    }

    /// Hand out the finished bytes. Fails if any nest is still open.
    pub fn finish(self) -> Result<Vec<u8>, AttrError> {
        if !self.nests.is_empty() {
            return Err(AttrError::UnbalancedNesting(NestingFault::LeftOpen {
                open: self.nests.len(),
            }));
        }
        Ok(self.buf)
    }

    fn reserve(&self, kind: u16, additional: usize) -> Result<(), AttrError> {
        let len = self.buf.len() + additional;
        if len > self.limit {
            return Err(AttrError::Oversized {
                kind: kind & NLA_TYPE_MASK,
                len,
                max: self.limit,
            });
        }
        Ok(())
    }

    fn write_header(&mut self, len: u16, kind: u16) {
        self.buf.extend_from_slice(&len.to_ne_bytes());
        self.buf.extend_from_slice(&kind.to_ne_bytes());
    }

    fn pad(&mut self) {
        let padded = nla_align(self.buf.len());
        self.buf.resize(padded, 0);
    }

    fn kind_at(&self, offset: usize) -> u16 {
        u16::from_ne_bytes([self.buf[offset + 2], self.buf[offset + 3]]) & NLA_TYPE_MASK
    }
}

// ── Reading ─────────────────────────────────────────────────────────────

/// One attribute read back from a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr<'a> {
    /// Attribute type with flag bits stripped.
    pub kind: u16,
    /// Whether the nested flag was set.
    pub nested: bool,
    /// Payload bytes (unpadded).
    pub payload: &'a [u8],
}

impl<'a> Attr<'a> {
    /// Iterate the children of a nest.
    pub fn children(&self) -> AttrIter<'a> {
        AttrIter::new(self.payload)
    }

    /// Interpret the payload as a host-order `u16`.
    pub fn as_u16(&self) -> Option<u16> {
        <[u8; 2]>::try_from(self.payload).ok().map(u16::from_ne_bytes)
    }

    /// Interpret the payload as a host-order `u32`.
    pub fn as_u32(&self) -> Option<u32> {
        <[u8; 4]>::try_from(self.payload).ok().map(u32::from_ne_bytes)
    }

    /// Interpret the payload as a NUL-terminated UTF-8 string.
    pub fn as_str(&self) -> Option<&'a str> {
        let (last, body) = self.payload.split_last()?;
        if *last != 0 {
            return None;
        }
        std::str::from_utf8(body).ok()
    }
}

/// Iterator over a run of attributes.
///
/// Stops at the first header that is truncated or whose length does not
/// fit the remaining bytes.
#[derive(Debug, Clone)]
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    /// Iterate the attributes in `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Find the first attribute of type `kind`.
    pub fn find_kind(mut self, kind: u16) -> Option<Attr<'a>> {
        self.find(|a| a.kind == kind)
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = Attr<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < NLA_HDRLEN {
            return None;
        }
        let len = usize::from(u16::from_ne_bytes([self.data[0], self.data[1]]));
        let raw_kind = u16::from_ne_bytes([self.data[2], self.data[3]]);
        if len < NLA_HDRLEN || len > self.data.len() {
            self.data = &[];
            return None;
        }
        let attr = Attr {
            kind: raw_kind & NLA_TYPE_MASK,
            nested: raw_kind & NLA_F_NESTED != 0,
            payload: &self.data[NLA_HDRLEN..len],
        };
        let advance = nla_align(len).min(self.data.len());
        self.data = &self.data[advance..];
        Some(attr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(buf: &[u8], at: usize) -> (u16, u16) {
        (
            u16::from_ne_bytes([buf[at], buf[at + 1]]),
            u16::from_ne_bytes([buf[at + 2], buf[at + 3]]),
        )
    }

    #[test]
    fn leaf_is_padded_but_len_is_not() {
        let mut b = AttrBuilder::new();
        b.put(7, &[1, 2, 3]).unwrap();
        let buf = b.finish().unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(header(&buf, 0), (7, 7));
        assert_eq!(&buf[4..], &[1, 2, 3, 0]);
    }

    #[test]
    fn string_carries_terminator() {
        let mut b = AttrBuilder::new();
        b.put_str(3, "can0").unwrap();
        let buf = b.finish().unwrap();
        assert_eq!(header(&buf, 0), (9, 3));
        assert_eq!(buf.len(), 12);
        let attr = AttrIter::new(&buf).next().unwrap();
        assert_eq!(attr.as_str(), Some("can0"));
    }

    #[test]
    fn nest_length_covers_padded_children() {
        let mut b = AttrBuilder::new();
        let outer = b.open_nest(18).unwrap();
        b.put_str(1, "can").unwrap(); // 4 + 4 = 8
        let inner = b.open_nest(2).unwrap();
        b.put_u16(11, 120).unwrap(); // 4 + 2 -> 8 padded
        b.close_nest(inner).unwrap();
        b.close_nest(outer).unwrap();
        let buf = b.finish().unwrap();

        assert_eq!(buf.len(), 4 + 8 + 4 + 8);
        assert_eq!(header(&buf, 0), (24, 18 | NLA_F_NESTED));
        assert_eq!(header(&buf, 12), (12, 2 | NLA_F_NESTED));
        assert_eq!(header(&buf, 16), (6, 11));
    }

    #[test]
    fn empty_nest_is_header_only() {
        let mut b = AttrBuilder::new();
        let n = b.open_nest(2).unwrap();
        b.close_nest(n).unwrap();
        let buf = b.finish().unwrap();
        assert_eq!(header(&buf, 0), (4, 2 | NLA_F_NESTED));
    }

    #[test]
    fn close_out_of_order_is_unbalanced() {
        let mut b = AttrBuilder::new();
        let outer = b.open_nest(1).unwrap();
        let _inner = b.open_nest(2).unwrap();
        let err = b.close_nest(outer).unwrap_err();
        assert_eq!(
            err,
            AttrError::UnbalancedNesting(NestingFault::OutOfOrder {
                closing: 0,
                innermost: 4,
            })
        );
        assert_eq!(b.depth(), 2);
    }

    #[test]
    fn close_twice_is_unbalanced() {
        let mut b = AttrBuilder::new();
        let n = b.open_nest(1).unwrap();
        let offset = n.offset();
        b.close_nest(n).unwrap();
        let err = b.close_nest(NestHandle { offset }).unwrap_err();
        assert_eq!(
            err,
            AttrError::UnbalancedNesting(NestingFault::NotOpen { closing: 0 })
        );
    }

    #[test]
    fn finish_with_open_nest_is_unbalanced() {
        let mut b = AttrBuilder::new();
        let _n = b.open_nest(1).unwrap();
        assert_eq!(
            b.finish().unwrap_err(),
            AttrError::UnbalancedNesting(NestingFault::LeftOpen { open: 1 })
        );
    }

    #[test]
    fn length_never_decreases() {
        let mut b = AttrBuilder::new();
        let mut last = b.len();
        let n = b.open_nest(1).unwrap();
        assert!(b.len() >= last);
        last = b.len();
        b.put_u32(2, 9).unwrap();
        assert!(b.len() >= last);
        last = b.len();
        b.close_nest(n).unwrap();
        assert_eq!(b.len(), last);
    }

    #[test]
    fn oversized_leaf_is_rejected() {
        let mut b = AttrBuilder::new();
        let big = vec![0u8; usize::from(u16::MAX)];
        assert!(matches!(
            b.put(1, &big),
            Err(AttrError::Oversized { kind: 1, .. })
        ));
        assert!(b.is_empty());
    }

    #[test]
    fn limit_is_enforced() {
        let mut b = AttrBuilder::with_limit(8);
        b.put_u32(1, 1).unwrap();
        assert!(matches!(
            b.put_u32(2, 2),
            Err(AttrError::Oversized { max: 8, .. })
        ));
    }

    #[test]
    fn iterator_walks_nests() {
        let mut b = AttrBuilder::new();
        b.put_str(3, "can0").unwrap();
        let n = b.open_nest(18).unwrap();
        b.put_u32(7, 1).unwrap();
        b.close_nest(n).unwrap();
        let buf = b.finish().unwrap();

        let attrs: Vec<_> = AttrIter::new(&buf).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].kind, 3);
        assert!(!attrs[0].nested);
        assert_eq!(attrs[1].kind, 18);
        assert!(attrs[1].nested);
        let child = attrs[1].children().find_kind(7).unwrap();
        assert_eq!(child.as_u32(), Some(1));
    }

    #[test]
    fn iterator_stops_on_truncation() {
        let bytes = [20u8, 0, 1, 0, 0, 0];
        let mut it = AttrIter::new(&bytes);
        // Host-endian length 20 (little) or 5120 (big) both overrun.
        assert!(it.next().is_none());
    }
}
