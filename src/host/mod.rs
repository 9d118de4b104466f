// SPDX-License-Identifier: Apache-2.0

//! Host backends performing the side effects requested by the guest.

mod memory;
mod mode;
mod native;

pub use memory::Memory;
pub use mode::OpenMode;
pub use native::Native;

use std::io::{self, Read, Seek, Write};
use std::sync::Arc;

use once_cell::sync::Lazy;

/// An open host file.
pub trait Stream: Read + Write + Seek + Send {}

impl<T: Read + Write + Seek + Send> Stream for T {}

pub trait Host: Send + Sync {
    /// The name of the host
    fn name(&self) -> &'static str;

    /// Whether or not the host can be used in this environment
    fn have(&self) -> bool {
        true
    }

    /// Reads a whole file.
    fn file_read(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Creates or truncates a file and writes `data` to it.
    fn file_write(&self, name: &str, data: &[u8]) -> io::Result<()>;

    /// Opens a file for stream access.
    fn open(&self, name: &str, mode: OpenMode) -> io::Result<Box<dyn Stream>>;

    /// Prints one line of guest output.
    fn println(&self, line: &str);

    /// 64 random bits
    fn random(&self) -> u64 {
        rand::random()
    }

    /// Wall-clock time in nanoseconds since the Unix epoch
    fn timestamp(&self) -> u64;
}

/// All hosts known to the debugger, in order of preference.
pub static HOSTS: Lazy<Vec<Arc<dyn Host>>> = Lazy::new(|| {
    vec![
        Arc::new(Native) as Arc<dyn Host>,
        Arc::clone(&*MEMORY) as Arc<dyn Host>,
    ]
});

/// The shared in-memory host, so its files and output can be inspected after a run.
pub static MEMORY: Lazy<Arc<Memory>> = Lazy::new(Arc::default);

/// Finds a usable host by name, or the first usable one.
pub fn pick(name: Option<&str>) -> Option<Arc<dyn Host>> {
    HOSTS
        .iter()
        .filter(|h| h.have())
        .find(|h| name.map_or(true, |name| h.name() == name))
        .cloned()
}
