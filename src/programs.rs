// SPDX-License-Identifier: Apache-2.0

//! Guest programs built into the debugger.
//!
//! Each program is the host-side rendition of a small guest binary: it only
//! talks to the outside world through host calls.

use crate::guest::Guest;
use crate::machine::{FlatMachine, Machine};
use crate::Result;

/// A guest program entry point: arguments in, exit code out.
pub type Main = fn(&mut Guest<FlatMachine>, &[String]) -> Result<i8>;

pub struct Program {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub main: Main,
}

pub static PROGRAMS: &[Program] = &[
    Program {
        name: "file_write",
        usage: "file_write",
        help: "Write \"Hello World!\\n\" to file_write_foo.txt",
        main: file_write::<FlatMachine>,
    },
    Program {
        name: "timestamp",
        usage: "timestamp",
        help: "Print the host time in nanoseconds",
        main: timestamp::<FlatMachine>,
    },
    Program {
        name: "random",
        usage: "random",
        help: "Print a random 64-bit number from the host",
        main: random::<FlatMachine>,
    },
    Program {
        name: "copy",
        usage: "copy SRC DST",
        help: "Copy a host file through the stdio host calls",
        main: copy::<FlatMachine>,
    },
    Program {
        name: "cat",
        usage: "cat",
        help: "Print the debugger input file (--read-file)",
        main: cat::<FlatMachine>,
    },
];

/// Looks up a built-in program by name.
pub fn find(name: &str) -> Option<&'static Program> {
    PROGRAMS.iter().find(|p| p.name == name)
}

const CHUNK: u64 = 4096;

/// Writes a fixed buffer to a fixed path. The result of the host call is
/// ignored and the program always succeeds.
pub fn file_write<M: Machine>(guest: &mut Guest<M>, _args: &[String]) -> Result<i8> {
    let data = guest.alloc_bytes(b"Hello World!\n")?;
    let size = 13;
    let path = guest.alloc_c_string("file_write_foo.txt")?;
    guest.file_write(path, data, size)?;
    Ok(0)
}

pub fn timestamp<M: Machine>(guest: &mut Guest<M>, _args: &[String]) -> Result<i8> {
    let now = guest.timestamp()?;
    guest.print(&format!("{now}\n"))?;
    Ok(0)
}

pub fn random<M: Machine>(guest: &mut Guest<M>, _args: &[String]) -> Result<i8> {
    let value = guest.random()?;
    guest.print(&format!("{value}\n"))?;
    Ok(0)
}

pub fn copy<M: Machine>(guest: &mut Guest<M>, args: &[String]) -> Result<i8> {
    let (src, dst) = match args {
        [src, dst] => (src, dst),
        _ => {
            guest.print("usage: copy SRC DST\n")?;
            return Ok(2);
        }
    };

    let (src_path, dst_path) = (guest.alloc_c_string(src)?, guest.alloc_c_string(dst)?);
    let (rb, wb) = (guest.alloc_c_string("rb")?, guest.alloc_c_string("wb")?);
    let buf = guest.alloc(CHUNK, 8)?;

    let input = guest.fopen(src_path, rb)?;
    if input == 0 {
        guest.print(&format!("copy: cannot open {src}\n"))?;
        return Ok(1);
    }
    let output = guest.fopen(dst_path, wb)?;
    if output == 0 {
        guest.fclose(input)?;
        guest.print(&format!("copy: cannot create {dst}\n"))?;
        return Ok(1);
    }

    let mut code = 0;
    loop {
        let n = guest.fread(buf, 1, CHUNK, input)?;
        if n == 0 {
            if guest.ferror(input)? != 0 {
                guest.print(&format!("copy: error reading {src}\n"))?;
                code = 1;
            }
            break;
        }
        if guest.fwrite(buf, 1, n, output)? != n {
            guest.print(&format!("copy: error writing {dst}\n"))?;
            code = 1;
            break;
        }
    }

    guest.fclose(input)?;
    if guest.fclose(output)? != 0 {
        code = 1;
    }
    Ok(code)
}

pub fn cat<M: Machine>(guest: &mut Guest<M>, _args: &[String]) -> Result<i8> {
    let buf = guest.alloc(CHUNK, 8)?;
    let len = guest.alloc(8, 8)?;
    loop {
        guest.machine_mut().store_u64(len, CHUNK)?;
        match guest.read_stream(buf, len)? {
            0 => {
                let n = guest.machine().load_u64(len)?;
                guest.write(libc::STDOUT_FILENO as u64, buf, n)?;
            }
            1 => return Ok(0),
            _ => {
                guest.print("cat: no input file\n")?;
                return Ok(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Host, Memory, Native};
    use crate::syscalls::Dispatcher;
    use crate::Error;

    use std::sync::Arc;

    use serial_test::serial;

    fn run(host: Arc<dyn Host>, input: Option<&[u8]>, name: &str, args: &[&str]) -> Result<i8> {
        let dispatcher = Dispatcher::debugger(host, input.map(<[u8]>::to_vec));
        let mut guest = Guest::new(FlatMachine::default(), dispatcher)?;
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let code = (find(name).unwrap().main)(&mut guest, &args)?;
        guest.exit()?;
        Ok(code)
    }

    #[test]
    fn names_are_unique() {
        for (i, p) in PROGRAMS.iter().enumerate() {
            assert!(PROGRAMS[i + 1..].iter().all(|q| q.name != p.name));
            assert!(p.usage.starts_with(p.name));
        }
        assert!(find("file_write").is_some());
        assert!(find("missing").is_none());
    }

    #[test]
    fn file_write_to_memory() {
        let host = Arc::new(Memory::default());
        assert_eq!(run(host.clone(), None, "file_write", &[]), Ok(0));
        assert_eq!(host.names(), ["file_write_foo.txt"]);
        assert_eq!(host.get("file_write_foo.txt").unwrap(), b"Hello World!\n");
    }

    #[test]
    #[serial]
    fn file_write_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();

        let code = run(Arc::new(Native), None, "file_write", &[]);
        std::env::set_current_dir(cwd).unwrap();

        assert_eq!(code, Ok(0));
        assert_eq!(
            std::fs::read(dir.path().join("file_write_foo.txt")).unwrap(),
            b"Hello World!\n"
        );
    }

    #[test]
    #[serial]
    fn file_write_ignores_host_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("file_write_foo.txt")).unwrap();
        let cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();

        let code = run(Arc::new(Native), None, "file_write", &[]);
        std::env::set_current_dir(cwd).unwrap();

        assert_eq!(code, Ok(0));
        assert!(dir.path().join("file_write_foo.txt").is_dir());
    }

    #[test]
    fn print_values() {
        let host = Arc::new(Memory::default());
        assert_eq!(run(host.clone(), None, "timestamp", &[]), Ok(0));
        assert_eq!(run(host.clone(), None, "random", &[]), Ok(0));

        let output = host.output();
        assert_eq!(output.len(), 2);
        assert!(output[0].parse::<u64>().unwrap() > 0);
        assert!(output[1].parse::<u64>().is_ok());
    }

    #[test]
    fn copy_file() {
        let host = Arc::new(Memory::default());
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        host.insert("src.bin", data.clone());

        assert_eq!(run(host.clone(), None, "copy", &["src.bin", "dst.bin"]), Ok(0));
        assert_eq!(host.get("dst.bin").unwrap(), data);
        assert!(host.output().is_empty());
    }

    #[test]
    fn copy_failures() {
        let host = Arc::new(Memory::default());
        assert_eq!(run(host.clone(), None, "copy", &["only-one"]), Ok(2));
        assert_eq!(run(host.clone(), None, "copy", &["missing", "dst"]), Ok(1));
        assert_eq!(
            host.output(),
            ["usage: copy SRC DST", "copy: cannot open missing"]
        );
        assert!(host.get("dst").is_none());
    }

    #[test]
    fn cat_input() {
        let host = Arc::new(Memory::default());
        let input: Vec<u8> = b"line\n".repeat(2000);
        assert_eq!(run(host.clone(), Some(&input), "cat", &[]), Ok(0));
        assert_eq!(host.output().len(), 2000);
        assert!(host.output().iter().all(|l| l == "line"));

        let host = Arc::new(Memory::default());
        assert_eq!(run(host.clone(), None, "cat", &[]), Ok(1));
        assert_eq!(host.output(), ["cat: no input file"]);
    }

    #[test]
    fn faults_stop_the_guest() {
        let host = Arc::new(Memory::default());
        let dispatcher = Dispatcher::debugger(host, None);
        let mut guest = Guest::new(FlatMachine::new(0x1800), dispatcher).unwrap();
        assert_eq!(
            cat(&mut guest, &[]),
            Err(Error::MemOutOfBound {
                addr: 0x1000,
                len: CHUNK
            })
        );
    }
}
