//! Codec for the SVR4 "new ASCII" cpio entry header (magic `070701`/`070702`).
//!
//! [`decode`] reads one header, its name and (for symlinks) its link target
//! from a stream. [`encode`] writes a header and its name and returns the
//! number of pad bytes that must follow the entry body. Bodies are handled
//! by the caller, or by [`ArchiveReader`]/[`ArchiveWriter`].
mod archive;
mod decode;
mod defs;
mod encode;
mod hex;

pub use archive::{ArchiveReader, ArchiveWriter, Entry};
pub use decode::decode;
pub use defs::{CPIO_HEADER_LEN, MAX_FILE_SIZE, MAX_NAME_SIZE, TRAILER_NAME};
pub use encode::{encode, write_body, write_trailer};

use std::fmt;

/// Error type for decoding and encoding cpio headers
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unexpected end of file")]
    Truncated { raw: Option<Box<RawHeader>> },

    #[error("Invalid magic: {:?}", .raw.magic())]
    InvalidMagic { raw: Box<RawHeader> },

    #[error("File size {size:#x} does not fit the 32-bit filesize field")]
    SizeTooLarge { size: u64, raw: Box<RawHeader> },

    #[error("Name size {size} outside of [1, {}]", MAX_NAME_SIZE)]
    InvalidNameSize { size: u64, raw: Box<RawHeader> },

    #[error("Checksum {checksum:#010x} set on a header without the checksum marker")]
    ChecksumInconsistent { checksum: u32, raw: Box<RawHeader> },

    #[error("Symlink target size {size} outside of [1, {}]", MAX_NAME_SIZE)]
    InvalidLinkSize { size: u64, raw: Box<RawHeader> },

    #[error("Value {value:#x} for '{field}' does not fit in 32 bits")]
    FieldOverflow { field: &'static str, value: u64 },

    #[error("Body is {actual} bytes but the header declares {declared}")]
    BodySizeMismatch { declared: u64, actual: u64 },

    #[error("File system error: {0}")]
    FileSystemError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The untouched fixed header that was being decoded when the error
    /// occurred, if it had been read in full.
    pub fn raw_header(&self) -> Option<&RawHeader> {
        match self {
            Error::Truncated { raw } => raw.as_deref(),
            Error::InvalidMagic { raw }
            | Error::SizeTooLarge { raw, .. }
            | Error::InvalidNameSize { raw, .. }
            | Error::ChecksumInconsistent { raw, .. }
            | Error::InvalidLinkSize { raw, .. } => Some(&**raw),
            _ => None,
        }
    }
}

/// The fixed 110 byte header exactly as it appeared on the wire
#[derive(Clone, PartialEq, Eq)]
pub struct RawHeader(pub(crate) [u8; defs::CPIO_HEADER_LEN]);

impl RawHeader {
    pub fn as_bytes(&self) -> &[u8; defs::CPIO_HEADER_LEN] {
        &self.0
    }

    /// The leading magic bytes, lossily converted for display
    pub fn magic(&self) -> String {
        String::from_utf8_lossy(&self.0[..defs::CPIO_MAGIC_LEN]).into_owned()
    }
}

impl fmt::Debug for RawHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawHeader")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}

/// Logical metadata of one archive entry
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub inode: u64,

    /// Permission bits and file type
    pub mode: u32,
    pub uid: u64,
    pub gid: u64,
    pub nlink: u64,

    /// Modification time in seconds since the Unix epoch
    pub mtime: u64,

    /// Length of the entry body. Decoded symlinks report 0, their body is
    /// already consumed into `link_target`.
    pub size: u64,

    /// Length of the name including its NUL terminator, set by decoding
    pub name_size: u64,
    pub checksum: u32,

    /// Name bytes as stored in the archive, without the NUL
    pub name: Vec<u8>,

    /// Target of a symlink entry, empty for everything else
    pub link_target: Vec<u8>,

    /// Bytes between the end of the name and the start of the body
    pub name_pad: u64,

    /// Bytes between the end of the body and the next header
    pub entry_pad: u64,
}

impl Header {
    pub fn is_symlink(&self) -> bool {
        self.mode & defs::S_IFMT == defs::S_IFLNK
    }

    pub fn is_file(&self) -> bool {
        self.mode & defs::S_IFMT == defs::S_IFREG
    }

    pub fn is_dir(&self) -> bool {
        self.mode & defs::S_IFMT == defs::S_IFDIR
    }

    pub fn is_trailer(&self) -> bool {
        self.name == TRAILER_NAME.as_bytes()
    }

    /// Name for display, invalid UTF-8 is replaced
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// `ls -l` style rendering of the mode, e.g. `-rwxr-xr-x`
    pub fn mode_str(&self) -> String {
        mode_to_str(self.mode)
    }
}

/// Whether a decoded header describes an entry or the end of the archive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Entry,
    EndOfArchive,
}

/// Result of a successful [`decode`]
#[derive(Clone, Debug)]
pub struct Decoded {
    pub header: Header,
    pub raw: RawHeader,
    pub outcome: Outcome,
}

/// Convert the file permissions portion of a file mode to a representative string
fn mode_perm_to_str(mode: u32, shift: usize) -> String {
    let mode = (mode >> shift) & 0o7;
    let mut perm_string = String::with_capacity(3);

    perm_string.push(if mode & defs::MODE_R != 0 { 'r' } else { '-' });
    perm_string.push(if mode & defs::MODE_W != 0 { 'w' } else { '-' });
    perm_string.push(if mode & defs::MODE_X != 0 { 'x' } else { '-' });

    perm_string
}

/// Convert a file mode to a representative string, unknown types render as '?'
fn mode_to_str(mode: u32) -> String {
    let mut mode_str = String::with_capacity(10);

    mode_str.push(match mode & defs::S_IFMT {
        defs::S_IFSOCK => 's',
        defs::S_IFLNK  => 'l',
        defs::S_IFREG  => '-',
        defs::S_IFBLK  => 'b',
        defs::S_IFDIR  => 'd',
        defs::S_IFCHR  => 'c',
        defs::S_IFIFO  => 'p',
        _ => '?',
    });

    mode_str.push_str(&mode_perm_to_str(mode, 6));
    mode_str.push_str(&mode_perm_to_str(mode, 3));
    mode_str.push_str(&mode_perm_to_str(mode, 0));

    mode_str
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_strings() {
        assert_eq!(mode_to_str(0o100644), "-rw-r--r--");
        assert_eq!(mode_to_str(0o040755), "drwxr-xr-x");
        assert_eq!(mode_to_str(0o120777), "lrwxrwxrwx");
        assert_eq!(mode_to_str(0o010600), "prw-------");
        assert_eq!(mode_to_str(0o000644), "?rw-r--r--");
    }

    #[test]
    fn type_predicates() {
        let link = Header { mode: 0o120777, ..Default::default() };
        assert!(link.is_symlink());
        assert!(!link.is_file());

        let dir = Header { mode: 0o040755, ..Default::default() };
        assert!(dir.is_dir());
    }
}
