mod local;

pub use local::LocalFileReader;

use anyhow::Result;

/// Trait for random access reading from an archive source
pub trait ReadAt {
    /// Read data at the specified offset into the buffer, returning the
    /// number of bytes copied
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill the whole buffer starting at `offset`, failing on a short read
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..])?;
            if n == 0 {
                anyhow::bail!(
                    "Unexpected end of archive at offset {}",
                    offset + filled as u64
                );
            }
            filled += n;
        }
        Ok(())
    }
}

/// In-memory archives, used when the whole container is already loaded
impl ReadAt for Vec<u8> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let start = (offset as usize).min(self.len());
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}
