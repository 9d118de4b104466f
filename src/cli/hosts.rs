// SPDX-License-Identifier: Apache-2.0

use hostcall::host::HOSTS;

use std::fmt::{self, Formatter};

use clap::Args;
use serde::Serialize;

/// Show the host backends and whether they are usable
#[derive(Args, Debug)]
pub struct Options {
    #[clap(short, long)]
    /// Emit JSON rather than human-readable output
    json: bool,
}

impl Options {
    pub fn execute(self) -> anyhow::Result<()> {
        let info = Info {
            version: hostcall::VERSION,
            hosts: HOSTS
                .iter()
                .map(|h| HostInfo {
                    name: h.name(),
                    usable: h.have(),
                })
                .collect(),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            print!("{info}");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Info {
    version: &'static str,
    hosts: Vec<HostInfo>,
}

#[derive(Serialize)]
struct HostInfo {
    name: &'static str,
    usable: bool,
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "hostcall version {}", self.version)?;
        for host in &self.hosts {
            let icon = if host.usable { "✔" } else { "✗" };
            writeln!(f, "{} Host: {}", icon, host.name)?;
        }
        Ok(())
    }
}
