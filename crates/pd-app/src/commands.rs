//! Line commands understood by the driver

use std::io::Write;

use anyhow::{bail, Result};
use pd_core::ControlId;
use pd_session::{DispatchError, DispatchReport, OutputId, Session};
use serde_json::json;

const HELP: &str = "commands: category <feature> | types <type>... | hover [<host> <year>] | \
                    show [output] | list | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a raw payload to one control
    Control { control: ControlId, args: Vec<String> },
    Show(Option<OutputId>),
    List,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines and `#` comments give `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let args: Vec<String> = words.map(str::to_string).collect();

        let command = match head.to_ascii_lowercase().as_str() {
            "show" => match args.as_slice() {
                [] => Command::Show(None),
                [output] => Command::Show(Some(output.parse()?)),
                _ => bail!("show takes at most one output"),
            },
            "list" => Command::List,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => match other.parse::<ControlId>() {
                Ok(control) => Command::Control { control, args },
                Err(_) => bail!("unknown command '{}'; {}", other, HELP),
            },
        };
        Ok(Some(command))
    }
}

pub fn execute<W: Write>(session: &Session, command: Command, out: &mut W) -> Result<Flow> {
    match command {
        Command::Control { control, args } => {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            match session.notify_raw(control, &args) {
                Ok(report) => print_report(session, &report, out)?,
                Err(e @ DispatchError::Control(_)) => print_error(out, &e.to_string())?,
                Err(e) => return Err(e.into()),
            }
        }
        Command::Show(None) => print_all(session, out)?,
        Command::Show(Some(output)) => print_output(session, output, out)?,
        Command::List => {
            for output in OutputId::ALL {
                if let Some(slot) = session.slot(output) {
                    let line = json!({
                        "output": output.as_str(),
                        "state": slot.state(),
                        "depends_on": slot.dependencies(),
                        "builds": slot.builds(),
                        "updated_at": slot.updated_at(),
                        "error": slot.last_error(),
                    });
                    writeln!(out, "{}", line)?;
                }
            }
        }
        Command::Help => writeln!(out, "{}", json!({ "help": HELP }))?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Print every output, in display order
pub fn print_all<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    for output in OutputId::ALL {
        print_output(session, output, out)?;
    }
    Ok(())
}

pub fn print_error<W: Write>(out: &mut W, message: &str) -> Result<()> {
    writeln!(out, "{}", json!({ "error": message }))?;
    Ok(())
}

fn print_report<W: Write>(session: &Session, report: &DispatchReport, out: &mut W) -> Result<()> {
    for output in report.recomputed() {
        print_output(session, output, out)?;
    }
    Ok(())
}

fn print_output<W: Write>(session: &Session, output: OutputId, out: &mut W) -> Result<()> {
    let Some(slot) = session.slot(output) else {
        return Ok(());
    };
    let line = json!({
        "output": output.as_str(),
        "state": slot.state(),
        "error": slot.last_error(),
        "artifact": slot.artifact().map(|a| a.to_json()),
    });
    writeln!(out, "{}", line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_session::SessionConfig;
    use serde_json::Value;

    fn lines(buf: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(buf)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn run(session: &Session, line: &str) -> Vec<Value> {
        let mut buf = Vec::new();
        let command = Command::parse(line).unwrap().unwrap();
        execute(session, command, &mut buf).unwrap();
        lines(&buf)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("# comment").unwrap(), None);
        assert_eq!(
            Command::parse("hover Salt Lake City 2002").unwrap(),
            Some(Command::Control {
                control: ControlId::Hover,
                args: vec!["Salt".into(), "Lake".into(), "City".into(), "2002".into()],
            })
        );
        assert_eq!(
            Command::parse("show bars").unwrap(),
            Some(Command::Show(Some(OutputId::BarCharts)))
        );
        assert_eq!(
            Command::parse("Types winter").unwrap(),
            Some(Command::Control {
                control: ControlId::Types,
                args: vec!["winter".into()],
            })
        );
        assert_eq!(Command::parse("QUIT").unwrap(), Some(Command::Quit));
        assert!(Command::parse("map Sydney 2000").is_err());
        assert!(Command::parse("plot everything").is_err());
        assert!(Command::parse("show nothing").is_err());
    }

    #[test]
    fn test_control_commands_print_rebuilt_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::new(pd_data::sample::write_sample(dir.path()).unwrap());
        let session = Session::open(&config).unwrap();

        let printed = run(&session, "category sports");
        assert_eq!(printed.len(), 1);
        assert_eq!(printed[0]["output"], "line-chart");
        assert_eq!(printed[0]["state"], "fresh");
        assert_eq!(printed[0]["artifact"]["kind"], "line_chart");
        assert_eq!(printed[0]["artifact"]["spec"]["y_label"], "Sports");

        let printed = run(&session, "types winter summer");
        let charts = printed[0]["artifact"]["spec"].as_array().unwrap();
        assert_eq!(charts[0]["id"], "bar-chart-winter");
        assert_eq!(charts[1]["id"], "bar-chart-summer");

        let printed = run(&session, "hover Sydney 2000");
        assert_eq!(printed[0]["artifact"]["spec"]["state"], "edition");
    }

    #[test]
    fn test_rejected_value_prints_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::new(pd_data::sample::write_sample(dir.path()).unwrap());
        let session = Session::open(&config).unwrap();

        let printed = run(&session, "category medals");
        assert_eq!(printed.len(), 1);
        assert!(printed[0]["error"].as_str().unwrap().contains("medals"));

        let printed = run(&session, "list");
        assert_eq!(printed.len(), 4);
        assert_eq!(printed[0]["builds"], 1);
    }

    #[test]
    fn test_quit_stops_loop() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::new(pd_data::SourceConfig::in_dir(dir.path()));
        let session = Session::open(&config).unwrap();
        let mut buf = Vec::new();
        assert_eq!(execute(&session, Command::Quit, &mut buf).unwrap(), Flow::Quit);
        assert!(buf.is_empty());
    }
}
