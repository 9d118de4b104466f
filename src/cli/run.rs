// SPDX-License-Identifier: Apache-2.0

use hostcall::guest::Guest;
use hostcall::host::{self, Host, Native, MEMORY};
use hostcall::machine::{FlatMachine, DEFAULT_MEMORY_SIZE};
use hostcall::programs;
use hostcall::syscalls::Dispatcher;

use anyhow::{anyhow, Context};
use clap::Args;
use log::info;

/// Exit code of a failed or faulting run.
const FAILURE: i32 = 254;

/// Run a built-in guest program.
#[derive(Args, Debug)]
pub struct Options {
    /// Set which host backend to use
    #[clap(long, env = "HOSTCALL_HOST")]
    pub host: Option<String>,

    /// File streamed to the guest by the read_stream host call ("-" for stdin)
    #[clap(long, value_name = "FILE")]
    pub read_file: Option<String>,

    /// Size of guest memory in bytes
    #[clap(long, default_value_t = DEFAULT_MEMORY_SIZE)]
    pub memory_size: usize,

    /// Name of the program to run (see `hostcall list`)
    #[clap(value_name = "PROGRAM")]
    pub program: String,

    /// Arguments passed to the program
    #[clap(value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Options {
    pub fn execute(self) -> anyhow::Result<()> {
        let Self {
            host,
            read_file,
            memory_size,
            program,
            args,
        } = self;

        let host = host::pick(host.as_deref()).ok_or_else(|| match &host {
            Some(name) => anyhow!("Host {:?} is unsupported. See `hostcall hosts`.", name),
            None => anyhow!("No usable host found."),
        })?;
        let program = programs::find(&program)
            .ok_or_else(|| anyhow!("Unknown program {:?}. See `hostcall list`.", program))?;

        // The input file lives on the machine running the debugger, whatever the host.
        let stream = read_file
            .map(|path| {
                Native
                    .file_read(&path)
                    .with_context(|| format!("reading input file {path:?}"))
            })
            .transpose()?;

        info!("running {} on the {} host", program.name, host.name());
        let dispatcher = Dispatcher::debugger(host.clone(), stream);
        let result = Guest::new(FlatMachine::new(memory_size), dispatcher).and_then(|mut guest| {
            let code = (program.main)(&mut guest, &args)?;
            guest.exit()?;
            Ok((code, guest.hostcalls()))
        });

        if host.name() == MEMORY.name() {
            for line in MEMORY.output() {
                println!("{line}");
            }
            for name in MEMORY.names() {
                let len = MEMORY.get(&name).map_or(0, |data| data.len());
                info!("memory host file {name:?}: {len} bytes");
            }
        }

        match result {
            Ok((code, hostcalls)) => {
                println!("Run result: {code}");
                println!("All hostcalls: {hostcalls}");
                std::process::exit(if code == 0 { 0 } else { FAILURE });
            }
            Err(e) => {
                println!("Run result: {e}");
                std::process::exit(FAILURE);
            }
        }
    }
}
