// SPDX-License-Identifier: Apache-2.0

use std::fs::OpenOptions;

/// Access requested by a C `fopen` mode string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub create: bool,
    pub truncate: bool,
    /// `x`: fail if the file already exists.
    pub exclusive: bool,
}

impl OpenMode {
    /// Parses `r`, `w`, `a`, optionally followed by `+`, `b` and the glibc
    /// flags `x`, `e`, `m`, `c`. Each modifier may appear once.
    ///
    /// `x` only takes effect for modes that create the file; `e`, `m` and
    /// `c` have no meaning here and are accepted as-is.
    pub fn parse(mode: &[u8]) -> Option<Self> {
        let (first, rest) = mode.split_first()?;
        let mut parsed = match first {
            b'r' => Self {
                read: true,
                ..Self::default()
            },
            b'w' => Self {
                write: true,
                create: true,
                truncate: true,
                ..Self::default()
            },
            b'a' => Self {
                append: true,
                create: true,
                ..Self::default()
            },
            _ => return None,
        };

        let mut seen = Vec::with_capacity(rest.len());
        for c in rest {
            if !b"+bxemc".contains(c) || seen.contains(c) {
                return None;
            }
            seen.push(*c);
        }

        parsed.exclusive = parsed.create && seen.contains(&b'x');
        if seen.contains(&b'+') {
            parsed.read = true;
            parsed.write |= !parsed.append;
        }
        Some(parsed)
    }

    /// Whether writing is allowed at all.
    pub fn writable(&self) -> bool {
        self.write || self.append
    }
}

impl From<OpenMode> for OpenOptions {
    fn from(mode: OpenMode) -> Self {
        let mut options = OpenOptions::new();
        options
            .read(mode.read)
            .write(mode.write)
            .append(mode.append)
            .create(mode.create)
            .truncate(mode.truncate)
            .create_new(mode.exclusive);
        options
    }
}
