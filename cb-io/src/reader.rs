//! Streaming package reader

use std::io::{self, Read};

use bytes::Bytes;
use cb_format::constants::{ATTACHMENT_ENTRY_LEN, PACKAGE_HEADER_LEN};
use cb_format::{AttachmentEntry, CbError, CbHash, CbObject, PackageHeader, Result};

use crate::{object_payload, ReadOptions};

/// Pull-based package reader.
///
/// The header, the directory and the root object are read by [`PackageReader::new`];
/// the remaining attachments are read one at a time, in directory order, as
/// the caller asks for them. The source is dropped once every attachment has
/// been consumed or the reader is closed.
pub struct PackageReader<R: Read> {
    reader: Option<R>,
    header: PackageHeader,
    entries: Vec<AttachmentEntry>,
    root: CbObject,
    next: usize,
    opts: ReadOptions,
}

impl<R: Read> PackageReader<R> {
    /// Read the header, the directory and the root object from `reader`
    pub fn new(mut reader: R, opts: ReadOptions) -> Result<Self> {
        let mut buf = [0u8; PACKAGE_HEADER_LEN];
        read_fixed(&mut reader, &mut buf, "package header")?;
        let header = PackageHeader::decode(&buf, &opts.limits)?;
        tracing::debug!(
            attachments = header.attachment_count,
            "decoded package header"
        );

        let count = header.entry_count();
        let mut entries = Vec::with_capacity(count.min(1024));
        let mut entry_buf = [0u8; ATTACHMENT_ENTRY_LEN];
        for _ in 0..count {
            read_fixed(&mut reader, &mut entry_buf, "attachment directory")?;
            entries.push(AttachmentEntry::decode(&entry_buf, &opts.limits)?);
        }
        entries[0].validate_root()?;

        let root_entry = entries[0];
        let payload = read_payload(&mut reader, root_entry.payload_size, "root object")?;
        let root = object_payload(&payload)
            .map_err(|err| CbError::Format(format!("root object is malformed: {}", err)))?;
        if opts.verify_hashes && root.hash() != root_entry.hash {
            return Err(hash_mismatch(0, &root_entry.hash, &root.hash()));
        }
        tracing::debug!(
            bytes = root_entry.payload_size,
            hash = %root_entry.hash,
            "read package root"
        );

        let mut this = Self {
            reader: Some(reader),
            header,
            entries,
            root,
            next: 1,
            opts,
        };
        this.release_if_done();
        Ok(this)
    }

    /// Package header
    pub fn header(&self) -> &PackageHeader {
        &self.header
    }

    /// Full directory, root entry first
    pub fn entries(&self) -> &[AttachmentEntry] {
        &self.entries
    }

    /// The root object
    pub fn root(&self) -> &CbObject {
        &self.root
    }

    /// Attachments not yet read
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.next
    }

    /// Iterate the remaining attachments
    pub fn attachments(&mut self) -> Attachments<'_, R> {
        Attachments { reader: self }
    }

    /// Read the next attachment.
    ///
    /// An error ends the sequence and releases the source.
    pub fn next_attachment(&mut self) -> Option<Result<(AttachmentEntry, Bytes)>> {
        let index = self.next;
        let entry = *self.entries.get(index)?;
        let reader = self.reader.as_mut()?;

        let result = read_payload(reader, entry.payload_size, "attachment")
            .and_then(|data| self.verify(index, &entry, &data).map(|_| data));

        match result {
            Ok(data) => {
                tracing::trace!(
                    index,
                    bytes = entry.payload_size,
                    hash = %entry.hash,
                    "read attachment"
                );
                self.next += 1;
                self.release_if_done();
                Some(Ok((entry, data)))
            }
            Err(err) => {
                self.next = self.entries.len();
                self.reader = None;
                Some(Err(err))
            }
        }
    }

    /// Abandon any unread attachments and release the source
    pub fn close(mut self) {
        if self.remaining() > 0 {
            tracing::debug!(skipped = self.remaining(), "closing package early");
        }
        self.next = self.entries.len();
        self.reader = None;
    }

    fn verify(&self, index: usize, entry: &AttachmentEntry, data: &Bytes) -> Result<()> {
        if !self.opts.verify_hashes || entry.is_compressed() {
            return Ok(());
        }
        let computed = if entry.is_object() {
            object_payload(data)
                .map_err(|err| {
                    CbError::Format(format!("attachment {} is not an object: {}", index, err))
                })?
                .hash()
        } else {
            CbHash::of(data)
        };
        if computed != entry.hash {
            return Err(hash_mismatch(index, &entry.hash, &computed));
        }
        Ok(())
    }

    fn release_if_done(&mut self) {
        if self.next >= self.entries.len() && self.reader.take().is_some() {
            tracing::trace!("package fully read");
        }
    }
}

impl<R: Read> Drop for PackageReader<R> {
    fn drop(&mut self) {
        if self.reader.is_some() && self.remaining() > 0 {
            tracing::warn!(
                unread = self.remaining(),
                "package reader dropped with unread attachments"
            );
        }
    }
}

/// Iterator over the attachments of a [`PackageReader`]
pub struct Attachments<'a, R: Read> {
    reader: &'a mut PackageReader<R>,
}

impl<'a, R: Read> Iterator for Attachments<'a, R> {
    type Item = Result<(AttachmentEntry, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_attachment()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.reader.remaining()))
    }
}

fn read_fixed<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|err| truncated(err, what))
}

/// Read exactly `size` bytes without trusting `size` for the allocation.
fn read_payload<R: Read>(reader: &mut R, size: u64, what: &str) -> Result<Bytes> {
    let mut data = Vec::with_capacity(usize::try_from(size.min(64 * 1024)).unwrap_or(0));
    let read = reader
        .take(size)
        .read_to_end(&mut data)
        .map_err(|err| truncated(err, what))?;
    if read as u64 != size {
        return Err(CbError::Format(format!(
            "package truncated in {}: expected {} bytes, got {}",
            what, size, read
        )));
    }
    Ok(Bytes::from(data))
}

fn truncated(err: io::Error, what: &str) -> CbError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        CbError::Format(format!("package truncated in {}", what))
    } else {
        CbError::Io(err)
    }
}

fn hash_mismatch(index: usize, expected: &CbHash, computed: &CbHash) -> CbError {
    CbError::Format(format!(
        "attachment {} hash mismatch: directory has {}, payload hashes to {}",
        index, expected, computed
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PackageWriter;
    use cb_codec::CbWriter;

    fn package_bytes(blobs: &[&[u8]]) -> Vec<u8> {
        let mut writer = CbWriter::new();
        writer.begin_object().unwrap();
        writer.name("count").write_u64(blobs.len() as u64).unwrap();
        writer.end_object().unwrap();

        let mut package = PackageWriter::new();
        package.add_root(&writer.save_object().unwrap()).unwrap();
        for blob in blobs {
            package.add_binary(blob.to_vec()).unwrap();
        }
        package.to_vec().unwrap()
    }

    #[test]
    fn test_attachments_stream_in_order() {
        let bytes = package_bytes(&[b"one", b"", b"three"]);
        let mut reader = PackageReader::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        assert_eq!(reader.root().find("count").as_u64(), 3);
        assert_eq!(reader.remaining(), 3);

        let data: Vec<Bytes> = reader
            .attachments()
            .map(|item| item.unwrap().1)
            .collect();
        assert_eq!(data, vec![&b"one"[..], &b""[..], &b"three"[..]]);
        assert_eq!(reader.remaining(), 0);
        assert!(reader.next_attachment().is_none());
    }

    #[test]
    fn test_payload_truncation_is_format_error() {
        let bytes = package_bytes(&[b"payload"]);
        let cut = &bytes[..bytes.len() - 2];
        let mut reader = PackageReader::new(cut, ReadOptions::default()).unwrap();
        let err = reader.next_attachment().unwrap().unwrap_err();
        assert!(matches!(err, CbError::Format(_)));
        assert!(reader.next_attachment().is_none());
    }

    #[test]
    fn test_directory_truncation_is_format_error() {
        let bytes = package_bytes(&[b"payload"]);
        let cut = &bytes[..PACKAGE_HEADER_LEN + 10];
        let err = PackageReader::new(cut, ReadOptions::default()).err().unwrap();
        assert!(matches!(err, CbError::Format(_)));
    }

    #[test]
    fn test_object_attachment_must_span_its_payload() {
        let mut writer = CbWriter::new();
        writer.begin_object().unwrap();
        writer.name("inner").write_bool(true).unwrap();
        writer.end_object().unwrap();
        let object = writer.save_object().unwrap();

        let mut data = object.to_bytes().to_vec();
        data.push(0);
        let entry = AttachmentEntry::object(data.len() as u64, object.hash());
        let mut package = PackageWriter::new();
        package.add_root(&object).unwrap();
        package
            .add(crate::CbAttachment::from_parts(entry, Bytes::from(data)).unwrap())
            .unwrap();
        let bytes = package.to_vec().unwrap();

        let mut reader = PackageReader::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        let err = reader.next_attachment().unwrap().unwrap_err();
        assert!(matches!(err, CbError::Format(_)));
    }

    #[test]
    fn test_close_stops_reading() {
        let bytes = package_bytes(&[b"a", b"b"]);
        let mut reader = PackageReader::new(bytes.as_slice(), ReadOptions::default()).unwrap();
        assert!(reader.next_attachment().unwrap().is_ok());
        reader.close();
    }
}
