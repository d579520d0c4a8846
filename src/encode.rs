use std::io::Write;

use log::trace;

use crate::defs::{
    CPIO_HEADER_LEN, CPIO_MAGIC_LEN, CRC_MAGIC, C_CHECK, C_FILESIZE, C_GID, C_INO, C_MODE, C_MTIME,
    C_NAMESIZE, C_NLINK, C_UID, NEWC_MAGIC, TRAILER_NAME,
};
use crate::hex::{pad4, write_hex};
use crate::{Error, Header};

const ZERO_PAD: [u8; 3] = [0; 3];

fn check_field(field: &'static str, value: u64) -> Result<u64, Error> {
    if value > u64::from(u32::MAX) {
        Err(Error::FieldOverflow { field, value })
    } else {
        Ok(value)
    }
}

/// Bytes occupied by a header whose name is `name_len` bytes long, padding included
pub(crate) fn encoded_len(name_len: usize) -> u64 {
    let unpadded = (CPIO_HEADER_LEN + name_len + 1) as u64;
    unpadded + pad4(unpadded)
}

/// Write the fixed header, the NUL terminated name and the padding after it.
///
/// Returns the number of zero bytes the caller must write after the
/// `header.size` body bytes. Neither the body nor that padding are written
/// here, see [`write_body`]. Only `inode`, `mode`, `uid`, `gid`, `nlink`,
/// `mtime`, `size`, `checksum` and `name` are encoded; each numeric value
/// must fit in 32 bits or [`Error::FieldOverflow`] is returned before
/// anything is written.
///
/// A symlink is encoded with `size` set to the length of its target, and
/// the target is then written as the body.
pub fn encode<W: Write>(w: &mut W, header: &Header) -> Result<u64, Error> {
    let name_size = header.name.len() as u64 + 1;

    let inode = check_field("inode", header.inode)?;
    let uid = check_field("uid", header.uid)?;
    let gid = check_field("gid", header.gid)?;
    let nlink = check_field("nlink", header.nlink)?;
    let mtime = check_field("mtime", header.mtime)?;
    let size = check_field("filesize", header.size)?;
    let name_size = check_field("namesize", name_size)?;

    let mut buf = [b'0'; CPIO_HEADER_LEN];

    let magic = if header.checksum != 0 { CRC_MAGIC } else { NEWC_MAGIC };
    buf[..CPIO_MAGIC_LEN].copy_from_slice(magic);

    write_hex(&mut buf[C_INO..], inode);
    write_hex(&mut buf[C_MODE..], u64::from(header.mode));
    write_hex(&mut buf[C_UID..], uid);
    write_hex(&mut buf[C_GID..], gid);
    write_hex(&mut buf[C_NLINK..], nlink);
    if mtime != 0 {
        write_hex(&mut buf[C_MTIME..], mtime);
    }
    write_hex(&mut buf[C_FILESIZE..], size);
    write_hex(&mut buf[C_NAMESIZE..], name_size);
    if header.checksum != 0 {
        write_hex(&mut buf[C_CHECK..], u64::from(header.checksum));
    }

    w.write_all(&buf)?;

    // null-terminated name
    w.write_all(&header.name)?;
    w.write_all(&[0])?;

    // pad to four byte alignment before start of file contents
    let name_pad = pad4(CPIO_HEADER_LEN as u64 + name_size);
    w.write_all(&ZERO_PAD[..name_pad as usize])?;

    trace!("Encoded cpio header for {:?} ({} bytes)", header.name_lossy(), size);

    Ok(pad4(size))
}

/// Write an entry body followed by the `entry_pad` zero bytes [`encode`] returned
pub fn write_body<W: Write>(w: &mut W, body: &[u8], entry_pad: u64) -> Result<(), Error> {
    w.write_all(body)?;
    w.write_all(&ZERO_PAD[..entry_pad.min(3) as usize])?;
    Ok(())
}

/// Write the `TRAILER!!!` entry that marks the end of an archive
pub fn write_trailer<W: Write>(w: &mut W) -> Result<(), Error> {
    let trailer = Header {
        nlink: 1,
        name: TRAILER_NAME.as_bytes().to_vec(),
        ..Default::default()
    };
    encode(w, &trailer)?;
    Ok(())
}
