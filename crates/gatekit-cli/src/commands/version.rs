// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::CliResult;

/// Executes the `version` command to display version information.
pub fn version(_cli: &Cli) -> CliResult<()> {
    println!("gatekit - bearer token authentication toolkit");
    println!();
    println!("Version Information:");
    println!("  gatekit-cli: {}", crate::VERSION);
    println!("  gatekit:     {}", gatekit::VERSION);
    println!();
    println!("Build Information:");
    println!("  Rust Edition: 2024");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
    println!();
    println!("Roles: {}", gatekit::Role::names());
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
