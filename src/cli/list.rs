// SPDX-License-Identifier: Apache-2.0

use hostcall::programs::PROGRAMS;

use clap::Args;

/// List the built-in guest programs
#[derive(Args, Debug)]
pub struct Options {}

impl Options {
    pub fn execute(self) -> anyhow::Result<()> {
        let width = PROGRAMS.iter().map(|p| p.usage.len()).max().unwrap_or(0);
        for program in PROGRAMS {
            println!("{:width$}  {}", program.usage, program.help);
        }
        Ok(())
    }
}
