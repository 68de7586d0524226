//! Named-file storage capability and scoped mounting.
//!
//! A [`FileSystem`] must be mounted before files can be read or written. [`Mounted`] is the
//! scope that holds the mount: it mounts on creation and unmounts when [`Mounted::unmount`]
//! is called or the guard is dropped, whichever comes first.

use crate::Result;

/// A storage volume holding small named files.
pub trait FileSystem {
    /// Make the volume available for reads and writes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageMount`](crate::Error::StorageMount) if the volume cannot be used.
    fn mount(&mut self) -> Result<()>;

    /// Release the volume.
    ///
    /// # Errors
    ///
    /// Returns an error if pending state could not be released.
    fn unmount(&mut self) -> Result<()>;

    /// Read the whole file at `path` into `buffer`, returning the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`](crate::Error::FileNotFound) if nothing is stored at
    /// `path`, or [`Error::FileTooLarge`](crate::Error::FileTooLarge) if it does not fit.
    fn read_file(&mut self, path: &str, buffer: &mut [u8]) -> Result<usize>;

    /// Replace the file at `path` with `contents`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened for writing.
    fn write_file(&mut self, path: &str, contents: &[u8]) -> Result<usize>;
}

/// A mounted [`FileSystem`]. Unmounts on drop.
pub struct Mounted<'a, F: FileSystem> {
    file_system: &'a mut F,
    mounted: bool,
}

impl<'a, F: FileSystem> Mounted<'a, F> {
    /// Mount `file_system` for the lifetime of the returned guard.
    ///
    /// # Errors
    ///
    /// Returns the mount error unchanged.
    pub fn new(file_system: &'a mut F) -> Result<Self> {
        file_system.mount()?;
        info!("Storage mounted");
        Ok(Self {
            file_system,
            mounted: true,
        })
    }

    /// See [`FileSystem::read_file`].
    ///
    /// # Errors
    ///
    /// See [`FileSystem::read_file`].
    pub fn read_file(&mut self, path: &str, buffer: &mut [u8]) -> Result<usize> {
        self.file_system.read_file(path, buffer)
    }

    /// See [`FileSystem::write_file`].
    ///
    /// # Errors
    ///
    /// See [`FileSystem::write_file`].
    pub fn write_file(&mut self, path: &str, contents: &[u8]) -> Result<usize> {
        self.file_system.write_file(path, contents)
    }

    /// Unmount now and report the outcome.
    ///
    /// # Errors
    ///
    /// Returns the unmount error unchanged.
    pub fn unmount(mut self) -> Result<()> {
        self.mounted = false;
        self.file_system.unmount()?;
        info!("Storage unmounted");
        Ok(())
    }
}

impl<F: FileSystem> Drop for Mounted<'_, F> {
    fn drop(&mut self) {
        if self.mounted {
            self.mounted = false;
            if let Err(err) = self.file_system.unmount() {
                warn!("Storage unmount failed: {}", err);
            }
        }
    }
}
