use std::io::{self, Read};

use log::{debug, trace};

use crate::defs::{
    CPIO_FIELD_LEN, CPIO_HEADER_LEN, CPIO_MAGIC_LEN, C_CHECK, C_FILESIZE, C_GID, C_INO, C_MODE,
    C_MTIME, C_NAMESIZE, C_NLINK, C_UID, MAGIC_PREFIX, MARKER_CHECKSUM, MARKER_NO_CHECKSUM,
    MAX_FILE_SIZE, MAX_NAME_SIZE,
};
use crate::hex::{pad4, read_hex};
use crate::{Decoded, Error, Header, Outcome, RawHeader};

/// Fill `buf` from the stream, a short read is reported as [`Error::Truncated`]
pub(crate) fn read_full<R: Read>(
    r: &mut R,
    buf: &mut [u8],
    raw: Option<&RawHeader>,
) -> Result<(), Error> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::Truncated {
            raw: raw.map(|raw| Box::new(raw.clone())),
        },
        _ => Error::Io(e),
    })
}

fn field(buf: &[u8; CPIO_HEADER_LEN], offset: usize) -> u64 {
    read_hex(&buf[offset..offset + CPIO_FIELD_LEN])
}

fn reject(err: Error) -> Error {
    debug!("Rejecting cpio header: {err}");
    err
}

/// Decode one entry header from `r`.
///
/// Consumes the fixed header, the name and the alignment padding after it.
/// For symlinks the link target (the entry body) is consumed as well and the
/// returned `size` is 0. When the entry is the trailer the name padding is
/// left in the stream and the outcome is [`Outcome::EndOfArchive`].
///
/// The body of any other entry and the `entry_pad` bytes following it are
/// left for the caller.
pub fn decode<R: Read>(r: &mut R) -> Result<Decoded, Error> {
    let mut buf = [0u8; CPIO_HEADER_LEN];
    read_full(r, &mut buf, None)?;
    let raw = RawHeader(buf);

    if !buf.starts_with(MAGIC_PREFIX) {
        return Err(reject(Error::InvalidMagic { raw: Box::new(raw) }));
    }
    let has_checksum = match buf[CPIO_MAGIC_LEN - 1] {
        MARKER_CHECKSUM => true,
        MARKER_NO_CHECKSUM => false,
        _ => return Err(reject(Error::InvalidMagic { raw: Box::new(raw) })),
    };

    let size = field(&buf, C_FILESIZE);
    if size > MAX_FILE_SIZE {
        return Err(reject(Error::SizeTooLarge { size, raw: Box::new(raw) }));
    }

    let name_size = field(&buf, C_NAMESIZE);
    if !(1..=MAX_NAME_SIZE).contains(&name_size) {
        return Err(reject(Error::InvalidNameSize { size: name_size, raw: Box::new(raw) }));
    }

    // 8 hex digits always fit in 32 bits
    let checksum = field(&buf, C_CHECK) as u32;
    if !has_checksum && checksum != 0 {
        return Err(reject(Error::ChecksumInconsistent { checksum, raw: Box::new(raw) }));
    }

    let mut name = vec![0u8; name_size as usize];
    read_full(r, &mut name, Some(&raw))?;
    name.pop();

    let mut header = Header {
        inode: field(&buf, C_INO),
        mode: field(&buf, C_MODE) as u32,
        uid: field(&buf, C_UID),
        gid: field(&buf, C_GID),
        nlink: field(&buf, C_NLINK),
        mtime: field(&buf, C_MTIME),
        size,
        name_size,
        checksum,
        name,
        link_target: Vec::new(),
        name_pad: pad4(CPIO_HEADER_LEN as u64 + name_size),
        entry_pad: pad4(size),
    };

    if header.is_trailer() {
        trace!("Reached cpio trailer");
        return Ok(Decoded { header, raw, outcome: Outcome::EndOfArchive });
    }

    let mut pad = [0u8; 3];
    read_full(r, &mut pad[..header.name_pad as usize], Some(&raw))?;

    if header.is_symlink() {
        if !(1..=MAX_NAME_SIZE).contains(&header.size) {
            return Err(reject(Error::InvalidLinkSize { size: header.size, raw: Box::new(raw) }));
        }
        let mut target = vec![0u8; header.size as usize];
        read_full(r, &mut target, Some(&raw))?;
        header.link_target = target;
        header.size = 0;
    }

    trace!("Decoded cpio header for {:?} ({} bytes)", header.name_lossy(), header.size);

    Ok(Decoded { header, raw, outcome: Outcome::Entry })
}
