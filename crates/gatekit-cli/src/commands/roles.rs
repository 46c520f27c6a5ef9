// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `roles` command.

use gatekit::Role;

use crate::cli::{OutputFormat, RolesArgs};
use crate::error::CliResult;

/// Returns every role with its priority, most privileged first.
pub fn role_table() -> CliResult<Vec<(Role, u8)>> {
    let mut table = Role::all()
        .iter()
        .map(|role| Ok((*role, role.priority()?)))
        .collect::<Result<Vec<_>, gatekit::auth::RoleError>>()
        .map_err(gatekit::AuthError::from)?;
    table.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(table)
}

/// Executes the `roles` command.
pub fn roles(args: &RolesArgs) -> CliResult<()> {
    let table = role_table()?;

    match args.format {
        OutputFormat::Text => {
            println!("{:<12} PRIORITY", "ROLE");
            for (role, priority) in &table {
                println!("{:<12} {}", role.as_str(), priority);
            }
        }
        OutputFormat::Json => {
            let output: Vec<_> = table
                .iter()
                .map(|(role, priority)| serde_json::json!({ "role": role, "priority": priority }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
