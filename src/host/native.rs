// SPDX-License-Identifier: Apache-2.0

use super::{Host, OpenMode, Stream};

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// The machine the debugger runs on.
///
/// Relative paths resolve against the working directory of the process. The
/// name `-` reads standard input.
pub struct Native;

impl Host for Native {
    #[inline]
    fn name(&self) -> &'static str {
        "native"
    }

    fn file_read(&self, name: &str) -> io::Result<Vec<u8>> {
        if name == "-" {
            let mut data = Vec::new();
            io::stdin().read_to_end(&mut data)?;
            Ok(data)
        } else {
            fs::read(name)
        }
    }

    fn file_write(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(name)?;
        file.write_all(data)?;
        Ok(())
    }

    fn open(&self, name: &str, mode: OpenMode) -> io::Result<Box<dyn Stream>> {
        let file = OpenOptions::from(mode).open(name)?;
        Ok(Box::new(file))
    }

    fn println(&self, line: &str) {
        println!("{line}");
    }

    fn timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    }
}
