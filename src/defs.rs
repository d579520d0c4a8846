pub(crate) const NEWC_MAGIC: &[u8] = b"070701";
pub(crate) const CRC_MAGIC: &[u8]  = b"070702";

/// Magic bytes shared by both markers, the 6th byte selects checksum presence
pub(crate) const MAGIC_PREFIX: &[u8] = b"07070";
pub(crate) const MARKER_NO_CHECKSUM: u8 = b'1';
pub(crate) const MARKER_CHECKSUM: u8 = b'2';

/// Name of the entry that terminates an archive
pub const TRAILER_NAME: &str = "TRAILER!!!";

pub(crate) const CPIO_MAGIC_LEN: usize = 6;
pub(crate) const CPIO_FIELD_LEN: usize = 8;

/// Total size of a NEWC/CRC cpio entry header
pub const CPIO_HEADER_LEN: usize = 110;

/// Field offsets inside the fixed header
pub(crate) const C_INO: usize       = 6;
pub(crate) const C_MODE: usize      = 14;
pub(crate) const C_UID: usize       = 22;
pub(crate) const C_GID: usize       = 30;
pub(crate) const C_NLINK: usize     = 38;
pub(crate) const C_MTIME: usize     = 46;
pub(crate) const C_FILESIZE: usize  = 54;
pub(crate) const C_NAMESIZE: usize  = 94;
pub(crate) const C_CHECK: usize     = 102;

/// Longest name (including its NUL) and symlink target accepted, PATH_MAX
pub const MAX_NAME_SIZE: u64 = 4096;

/// Largest body a 32-bit filesize field can describe
pub const MAX_FILE_SIZE: u64 = 0xffff_ffff;

/// Traditional cpio writers pad the finished archive to this block size
pub(crate) const ARCHIVE_BLOCK_LEN: u64 = 512;

/// POSIX file mode constants
pub(crate) const S_IFMT   : u32 = 0o170000; // bit mask file type bit field
pub(crate) const S_IFSOCK : u32 = 0o140000; // socket
pub(crate) const S_IFLNK  : u32 = 0o120000; // symbolic link
pub(crate) const S_IFREG  : u32 = 0o100000; // regular file
pub(crate) const S_IFBLK  : u32 = 0o060000; // block device
pub(crate) const S_IFDIR  : u32 = 0o040000; // directory
pub(crate) const S_IFCHR  : u32 = 0o020000; // character device
pub(crate) const S_IFIFO  : u32 = 0o010000; // FIFO
pub(crate) const MODE_R: u32 = 0o04;
pub(crate) const MODE_W: u32 = 0o02;
pub(crate) const MODE_X: u32 = 0o01;
