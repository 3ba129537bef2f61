//! `configure` command: interactive setup.
//!
//! Walks the user through picking the controller's port, its baud rate and
//! the game's log folder, then writes the configuration file.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cockpit_core::Config;
use cockpit_core::constants::{DEFAULT_BAUD_RATE, DEFAULT_LOG_DIR_SUFFIX};
use cockpit_hardware::{PortInfo, available_ports};

use super::ports::write_port_table;

/// Result of the setup prompts.
#[derive(Debug, PartialEq, Eq)]
pub enum WizardOutcome {
    Configured(Config),
    Cancelled,
}

/// Run the setup wizard against the terminal and save the result.
pub fn execute(config_path: &Path) -> Result<()> {
    let ports = available_ports().context("Couldn't list serial ports")?;
    let default_log_dir = dirs::home_dir().map(|home| home.join(DEFAULT_LOG_DIR_SUFFIX));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let outcome = prompt(
        stdin.lock(),
        &mut stdout,
        &ports,
        default_log_dir.as_deref(),
    )?;

    match outcome {
        WizardOutcome::Configured(config) => {
            config
                .save(config_path)
                .with_context(|| format!("Couldn't write {}", config_path.display()))?;
            writeln!(stdout, "Wrote config to {}", config_path.display())?;
        }
        WizardOutcome::Cancelled => {}
    }

    Ok(())
}

/// Ask for the port, baud rate and log folder.
///
/// `default_log_dir` is offered when it exists. Entering anything but a
/// number at the port selection cancels.
pub fn prompt<R: BufRead, W: Write>(
    mut input: R,
    out: &mut W,
    ports: &[PortInfo],
    default_log_dir: Option<&Path>,
) -> Result<WizardOutcome> {
    if ports.is_empty() {
        bail!("No serial ports found; connect the controller and try again");
    }

    write_port_table(out, ports)?;

    write!(out, "\nEnter selection or c to cancel: ")?;
    let selection = read_line(&mut input, out)?;
    let index: usize = match selection.parse() {
        Ok(index) => index,
        Err(_) => {
            writeln!(out, "Cancelled")?;
            return Ok(WizardOutcome::Cancelled);
        }
    };
    let port = match index.checked_sub(1).and_then(|i| ports.get(i)) {
        Some(port) => port,
        None => bail!("Invalid selection: {}", selection),
    };

    write!(out, "Enter baud rate [{}]: ", DEFAULT_BAUD_RATE)?;
    let baud = read_line(&mut input, out)?;
    let baud_rate = if baud.is_empty() {
        DEFAULT_BAUD_RATE
    } else {
        match baud.parse::<u32>() {
            Ok(rate) if rate > 0 => rate,
            _ => bail!("Invalid baud rate: {}", baud),
        }
    };

    let default_log_dir = default_log_dir.filter(|dir| dir.is_dir());
    match default_log_dir {
        Some(dir) => {
            writeln!(out, "\nDefault logs folder: {}", dir.display())?;
            write!(out, "Enter a different one, or press enter to use the above: ")?;
        }
        None => write!(out, "Enter the Elite Dangerous log path: ")?,
    }
    let entered = read_line(&mut input, out)?;

    let log_dir = if !entered.is_empty() {
        let dir = PathBuf::from(&entered);
        if !dir.is_dir() {
            bail!("Couldn't find the selected log path: {}", entered);
        }
        dir
    } else if let Some(dir) = default_log_dir {
        dir.to_path_buf()
    } else {
        bail!("Must enter a valid path");
    };

    let config = Config::new(port.device_id.clone(), baud_rate, log_dir);
    config.validate()?;

    Ok(WizardOutcome::Configured(config))
}

/// Read one trimmed line. End of input reads as an empty line.
fn read_line<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<String> {
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cockpit_hardware::PortKind;
    use rstest::rstest;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn ports() -> Vec<PortInfo> {
        vec![
            PortInfo::new("COM1", PortKind::Pci),
            PortInfo::usb("COM3", 0x2341, 0x8036, Some("HIDPC")).with_description("Arduino Leonardo"),
        ]
    }

    fn run(input: &str, default_log_dir: Option<&Path>) -> (Result<WizardOutcome>, String) {
        let mut out = Vec::new();
        let outcome = prompt(Cursor::new(input), &mut out, &ports(), default_log_dir);
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_full_selection() {
        let logs = TempDir::new().unwrap();
        let input = format!("2\n115200\n{}\n", logs.path().display());

        let (outcome, output) = run(&input, None);

        assert_eq!(
            outcome.unwrap(),
            WizardOutcome::Configured(Config::new(
                "USB\\VID_2341&PID_8036\\HIDPC",
                115200,
                logs.path()
            ))
        );
        assert!(output.contains("Arduino Leonardo"));
        assert!(output.contains("Enter the Elite Dangerous log path: "));
    }

    #[test]
    fn test_defaults_accepted() {
        let logs = TempDir::new().unwrap();

        let (outcome, output) = run("1\n\n\n", Some(logs.path()));

        assert_eq!(
            outcome.unwrap(),
            WizardOutcome::Configured(Config::new("COM1", DEFAULT_BAUD_RATE, logs.path()))
        );
        assert!(output.contains(&format!("Default logs folder: {}", logs.path().display())));
    }

    #[test]
    fn test_missing_default_folder_not_offered() {
        let logs = TempDir::new().unwrap();
        let missing = logs.path().join("Elite Dangerous");

        let (outcome, output) = run("1\n9600\n\n", Some(&missing));

        assert!(outcome.is_err());
        assert!(!output.contains("Default logs folder"));
    }

    #[rstest]
    #[case("c\n")]
    #[case("\n")]
    #[case("")]
    fn test_non_number_cancels(#[case] input: &str) {
        let (outcome, output) = run(input, None);

        assert_eq!(outcome.unwrap(), WizardOutcome::Cancelled);
        assert!(output.ends_with("Cancelled\n"));
    }

    #[rstest]
    #[case("0\n")]
    #[case("3\n")]
    fn test_out_of_range_selection(#[case] input: &str) {
        let (outcome, _) = run(input, None);
        let error = outcome.unwrap_err();
        assert!(error.to_string().starts_with("Invalid selection"));
    }

    #[rstest]
    #[case("fast\n")]
    #[case("0\n")]
    #[case("-9600\n")]
    fn test_invalid_baud_rate(#[case] baud: &str) {
        let (outcome, _) = run(&format!("1\n{baud}"), None);
        let error = outcome.unwrap_err();
        assert!(error.to_string().starts_with("Invalid baud rate"));
    }

    #[test]
    fn test_entered_folder_must_exist() {
        let logs = TempDir::new().unwrap();
        let input = format!("1\n9600\n{}\n", logs.path().join("nope").display());

        let (outcome, _) = run(&input, Some(logs.path()));

        let error = outcome.unwrap_err();
        assert!(error.to_string().starts_with("Couldn't find the selected log path"));
    }

    #[test]
    fn test_no_ports() {
        let mut out = Vec::new();
        let outcome = prompt(Cursor::new("1\n"), &mut out, &[], None);
        assert!(outcome.is_err());
    }
}
