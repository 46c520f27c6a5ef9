// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! gatekit - bearer token operator CLI
//!
//! Main binary entry point.

use gatekit_cli::{commands, error::report_error_and_exit, init_logging, Cli};

fn main() {
    let cli = Cli::parse_args();
    if let Err(e) = init_logging(cli.effective_log_level(), cli.log_format) {
        eprintln!("warning: logging not initialized: {e}");
    }

    if let Err(e) = commands::execute(&cli) {
        report_error_and_exit(e);
    }
}
