//! `ports` command: list candidate controllers.

use std::io::{self, Write};

use anyhow::{Context, Result};
use cockpit_hardware::{PortInfo, available_ports};

/// Print the available serial ports.
pub fn execute(json: bool) -> Result<()> {
    let ports = available_ports().context("Couldn't list serial ports")?;
    let mut stdout = io::stdout().lock();

    if json {
        let output = serde_json::to_string_pretty(&ports)?;
        writeln!(stdout, "{}", output)?;
    } else if ports.is_empty() {
        writeln!(stdout, "No serial ports found")?;
    } else {
        write_port_table(&mut stdout, &ports)?;
    }

    Ok(())
}

/// Write a numbered, column-aligned table of `ports`.
///
/// Numbering starts at 1, matching the selection the setup wizard expects.
pub fn write_port_table<W: Write>(out: &mut W, ports: &[PortInfo]) -> io::Result<()> {
    let index_width = format!("{})", ports.len()).len().max(1);
    let port_width = column_width("Port", ports.iter().map(|p| p.port_name.as_str()));
    let id_width = column_width("Device ID", ports.iter().map(|p| p.device_id.as_str()));

    writeln!(
        out,
        "{:<index_width$}  {:<port_width$}  {:<id_width$}  Description",
        "#", "Port", "Device ID"
    )?;
    for (i, port) in ports.iter().enumerate() {
        writeln!(
            out,
            "{:<index_width$}  {:<port_width$}  {:<id_width$}  {}",
            format!("{})", i + 1),
            port.port_name,
            port.device_id,
            port.description
        )?;
    }

    Ok(())
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).chain([header.len()]).max().unwrap_or(0)
}
