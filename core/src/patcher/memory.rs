use crate::{trace, warn};
use region::Protection;
use std::io::{Error, ErrorKind};

/// Overwrite `bytes.len()` bytes of code at `address`.
///
/// Once the bytes are copied the write counts as done: failing to restore the previous page
/// protection or to flush the instruction cache is logged, not returned.
///
/// # Safety
///
/// `address` must point at mapped code of at least `bytes.len()` bytes that no thread
/// executes during the write.
pub(crate) unsafe fn write_code(address: usize, bytes: &[u8]) -> std::io::Result<()> {
    if address == 0 {
        return Err(Error::new(ErrorKind::InvalidInput, "write to null address"));
    }
    let target = address as *mut u8;
    let original = region::query_range(target.cast_const(), bytes.len())
        .map_err(into_io)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(into_io)?;
    trace!(
        "writing {} bytes at {:#x} across {} region(s)",
        bytes.len(),
        address,
        original.len()
    );
    region::protect(target.cast_const(), bytes.len(), Protection::READ_WRITE_EXECUTE)
        .map_err(into_io)?;
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), target, bytes.len());
    for page in &original {
        if let Err(e) = region::protect(page.as_ptr::<u8>(), page.len(), page.protection()) {
            warn!(
                "jump written at {:#x}, but restoring {:?} on {:p} failed: {}",
                address,
                page.protection(),
                page.as_ptr::<u8>(),
                e
            );
        }
    }
    let end = target.add(bytes.len());
    if !clear_cache::clear_cache(target.cast_const(), end.cast_const()) {
        warn!("jump written at {:#x}, but flushing the instruction cache failed", address);
    }
    Ok(())
}

/// Surface a `region` failure as the `std::io::Error` the backends return.
fn into_io(error: region::Error) -> Error {
    match error {
        region::Error::SystemCall(e) => e,
        region::Error::UnmappedRegion => Error::new(ErrorKind::NotFound, "address is not mapped"),
        other => Error::new(ErrorKind::InvalidInput, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUMP: [u8; 5] = [0xE9, 0x00, 0x00, 0x00, 0x00];

    #[test]
    fn null_address_is_rejected() {
        let error = unsafe { write_code(0, &[0x90]) }.unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, error.kind());
    }

    #[cfg(not(all(target_os = "macos", target_arch = "aarch64")))]
    #[test]
    fn read_execute_code_stays_read_execute() -> std::io::Result<()> {
        let mut page =
            region::alloc(region::page::size(), Protection::READ_WRITE).map_err(into_io)?;
        let entry = page.as_mut_ptr::<u8>();
        unsafe {
            entry.write(0xC3);
            region::protect(entry.cast_const(), 1, Protection::READ_EXECUTE).map_err(into_io)?;
            write_code(entry as usize, &JUMP)?;
        }
        let after = region::query(entry.cast_const()).map_err(into_io)?;
        assert_eq!(Protection::READ_EXECUTE, after.protection());
        assert_eq!(&JUMP, unsafe { std::slice::from_raw_parts(entry.cast_const(), JUMP.len()) });
        Ok(())
    }

    // hardened runtimes refuse writable and executable pages
    #[cfg(not(all(target_os = "macos", target_arch = "aarch64")))]
    #[test]
    fn jit_pages_keep_write_access() -> std::io::Result<()> {
        let mut page = region::alloc(region::page::size(), Protection::READ_WRITE_EXECUTE)
            .map_err(into_io)?;
        let entry = page.as_mut_ptr::<u8>();
        unsafe {
            entry.write(0xC3);
            write_code(entry as usize, &JUMP)?;
        }
        let after = region::query(entry.cast_const()).map_err(into_io)?;
        assert_eq!(Protection::READ_WRITE_EXECUTE, after.protection());
        Ok(())
    }
}
