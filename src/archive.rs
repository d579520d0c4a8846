use std::fs::{read_link, symlink_metadata, File};
use std::io::{Read, Write};
use std::os::unix::ffi::OsStringExt;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use fallible_iterator::FallibleIterator;
use log::debug;

use crate::decode::{decode, read_full};
use crate::defs::{ARCHIVE_BLOCK_LEN, TRAILER_NAME};
use crate::encode::{encode, encoded_len, write_body, write_trailer};
use crate::{Error, Header, Outcome, RawHeader};

/// One archive entry together with its body
#[derive(Clone, Debug)]
pub struct Entry {
    pub header: Header,
    pub raw: RawHeader,

    /// Entry contents, empty for symlinks whose target is in `header.link_target`
    pub body: Vec<u8>,
}

/// Iterates the entries of an archive stream until the trailer
pub struct ArchiveReader<R> {
    reader: R,
    done: bool,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(reader: R) -> Self {
        ArchiveReader { reader, done: false }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> FallibleIterator for ArchiveReader<R> {
    type Item = Entry;
    type Error = Error;

    fn next(&mut self) -> Result<Option<Self::Item>, Self::Error> {
        if self.done {
            return Ok(None);
        }

        let decoded = decode(&mut self.reader)?;
        if decoded.outcome == Outcome::EndOfArchive {
            self.done = true;
            return Ok(None);
        }

        let header = decoded.header;
        let raw = decoded.raw;

        // grow with the data actually present instead of trusting filesize
        let mut body = Vec::new();
        (&mut self.reader).take(header.size).read_to_end(&mut body)?;
        if (body.len() as u64) < header.size {
            return Err(Error::Truncated { raw: Some(Box::new(raw)) });
        }

        // symlinks still carry the padding for the target consumed by decode
        let mut pad = [0u8; 3];
        read_full(&mut self.reader, &mut pad[..header.entry_pad as usize], Some(&raw))?;

        Ok(Some(Entry { header, raw, body }))
    }
}

/// Writes entries to an archive stream, keeping track of alignment
pub struct ArchiveWriter<W> {
    writer: W,

    /// bytes written, needed for the final block padding
    written: u64,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        ArchiveWriter { writer, written: 0 }
    }

    /// Append an entry whose body must be exactly `header.size` bytes
    pub fn append(&mut self, header: &Header, body: &[u8]) -> Result<(), Error> {
        if body.len() as u64 != header.size {
            return Err(Error::BodySizeMismatch {
                declared: header.size,
                actual: body.len() as u64,
            });
        }

        let entry_pad = encode(&mut self.writer, header)?;
        write_body(&mut self.writer, body, entry_pad)?;

        self.written += encoded_len(header.name.len()) + header.size + entry_pad;
        Ok(())
    }

    /// Append a symlink, the target is stored as the entry body
    pub fn append_symlink(&mut self, header: &Header, target: &[u8]) -> Result<(), Error> {
        let header = Header {
            size: target.len() as u64,
            link_target: target.to_vec(),
            ..header.clone()
        };
        self.append(&header, target)
    }

    /// Append the file, directory or symlink at `fs_path` under `archive_path`
    pub fn append_path(&mut self, fs_path: &Path, archive_path: &str) -> Result<(), Error> {
        let archive_path = if archive_path.is_empty() {
            "."
        } else {
            archive_path
        };

        let meta = symlink_metadata(fs_path).map_err(|_| {
            Error::FileSystemError(
                format!("Failed to get metadata for {}", fs_path.to_string_lossy())
            )
        })?;

        let header = Header {
            // inode numbers wider than the field are truncated
            inode: meta.ino() & u64::from(u32::MAX),
            mode: meta.mode(),
            uid: u64::from(meta.uid()),
            gid: u64::from(meta.gid()),
            nlink: meta.nlink(),
            mtime: u64::try_from(meta.mtime()).unwrap_or(0),
            name: archive_path.as_bytes().to_vec(),
            ..Default::default()
        };

        if meta.is_symlink() {
            let target = read_link(fs_path).map_err(|_| {
                Error::FileSystemError(
                    format!("Failed to read symlink target for {}", fs_path.to_string_lossy())
                )
            })?;
            return self.append_symlink(&header, &target.into_os_string().into_vec());
        }

        let mut content = vec![];
        if meta.is_file() {
            let mut fp = File::open(fs_path).map_err(|_| {
                Error::FileSystemError(
                    format!("Failed to open file {}", fs_path.to_string_lossy())
                )
            })?;
            fp.read_to_end(&mut content).map_err(|_| {
                Error::FileSystemError(
                    format!("Failed to read to end of file {}", fs_path.to_string_lossy())
                )
            })?;
        }

        debug!("Appending {} as {:?}", fs_path.to_string_lossy(), archive_path);

        let header = Header { size: content.len() as u64, ..header };
        self.append(&header, &content)
    }

    /// Write the trailer, pad the archive to a whole block and return the stream
    pub fn finish(mut self) -> Result<W, Error> {
        write_trailer(&mut self.writer)?;
        self.written += encoded_len(TRAILER_NAME.len());

        let rem = self.written % ARCHIVE_BLOCK_LEN;
        if rem != 0 {
            let padding = vec![0u8; (ARCHIVE_BLOCK_LEN - rem) as usize];
            self.writer.write_all(&padding)?;
        }

        self.writer.flush()?;
        Ok(self.writer)
    }
}
