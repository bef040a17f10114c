//! Interactive upload shell.

use std::str::FromStr;

use bgprints_core::models::{Service, ServiceId};
use bgprints_core::ErrorMetadata;
use bgprints_services::{AttachOutcome, RemoveOutcome, UploadError, UploadSession};
use tokio::io::AsyncBufRead;

use crate::adapters::Terminal;
use crate::render_snapshot;

pub const HELP: &str = "\
Commands:
  add SERVICE          pick a file for SERVICE
  rm SERVICE NAME      remove NAME from SERVICE
  clear SERVICE        remove every file for SERVICE
  ls                   list attached files
  services             list the vendor's services
  submit               upload everything
  quit                 leave without uploading";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add(ServiceId),
    Remove { service_id: ServiceId, name: String },
    Clear(ServiceId),
    List,
    Services,
    Submit,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let service = |s: &str| -> Result<ServiceId, String> {
            if s.is_empty() {
                return Err(format!("usage: {} SERVICE", verb));
            }
            s.parse().map_err(|e: anyhow::Error| e.to_string())
        };

        match verb.to_lowercase().as_str() {
            "add" => Ok(ShellCommand::Add(service(rest)?)),
            "rm" | "remove" => {
                let (id, name) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "usage: rm SERVICE NAME".to_string())?;
                Ok(ShellCommand::Remove {
                    service_id: service(id)?,
                    name: name.trim().to_string(),
                })
            }
            "clear" => Ok(ShellCommand::Clear(service(rest)?)),
            "ls" | "list" => Ok(ShellCommand::List),
            "services" => Ok(ShellCommand::Services),
            "submit" | "upload" => Ok(ShellCommand::Submit),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{}', try 'help'", other)),
        }
    }
}

/// Print a session error the way the app shows an alert.
pub fn report(err: &UploadError) {
    match err {
        UploadError::Rejected(rejection) => {
            println!("{}: {}", rejection.title(), err.client_message());
        }
        _ => println!("Error: {}", err.client_message()),
    }
    if let Some(action) = err.suggested_action() {
        println!("  {}", action);
    }
}

/// Run the shell until `quit`, end of input, or a successful submit.
pub async fn run<R: AsyncBufRead + Unpin + Send>(
    session: &mut UploadSession,
    terminal: &Terminal<R>,
    services: &[Service],
) -> anyhow::Result<()> {
    let limits = session.limits();
    println!("{}", HELP);

    loop {
        let Some(line) = terminal.ask("upload> ").await? else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        let command = match line.parse::<ShellCommand>() {
            Ok(command) => command,
            Err(msg) => {
                println!("{}", msg);
                continue;
            }
        };

        match command {
            ShellCommand::Add(service_id) => match session.attach(service_id).await {
                Ok(AttachOutcome::Attached(snapshot)) => {
                    print!("{}", render_snapshot(&snapshot, limits.max_files, limits.max_total_size));
                }
                Ok(AttachOutcome::Cancelled) => println!("No file selected."),
                Err(e) => report(&e),
            },
            ShellCommand::Remove { service_id, name } => {
                match session.remove(service_id, &name).await {
                    Ok(RemoveOutcome::Removed(snapshot)) => {
                        print!("{}", render_snapshot(&snapshot, limits.max_files, limits.max_total_size));
                    }
                    Ok(RemoveOutcome::Cancelled) => println!("Kept {}.", name),
                    Err(e) => report(&e),
                }
            }
            ShellCommand::Clear(service_id) => match session.remove_all(service_id).await {
                Ok(RemoveOutcome::Removed(snapshot)) => {
                    print!("{}", render_snapshot(&snapshot, limits.max_files, limits.max_total_size));
                }
                Ok(RemoveOutcome::Cancelled) => println!("Kept files for service {}.", service_id),
                Err(e) => report(&e),
            },
            ShellCommand::List => {
                print!("{}", render_snapshot(&session.snapshot(), limits.max_files, limits.max_total_size));
            }
            ShellCommand::Services => {
                for service in services {
                    println!("  {:>4}  {}", service.id, service.name);
                }
            }
            ShellCommand::Submit => match session.submit().await {
                Ok(receipt) => {
                    println!("Files have been successfully uploaded ({} stored).", receipt.file_count());
                    return Ok(());
                }
                Err(e) => report(&e),
            },
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => break,
        }
    }

    if !session.snapshot().is_empty() {
        println!("Left without uploading; attached files were discarded.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("add 3".parse::<ShellCommand>(), Ok(ShellCommand::Add(ServiceId(3))));
        assert_eq!(
            "rm 3 my thesis.pdf".parse::<ShellCommand>(),
            Ok(ShellCommand::Remove {
                service_id: ServiceId(3),
                name: "my thesis.pdf".to_string()
            })
        );
        assert_eq!("clear 1".parse::<ShellCommand>(), Ok(ShellCommand::Clear(ServiceId(1))));
        assert_eq!("  LS ".parse::<ShellCommand>(), Ok(ShellCommand::List));
        assert_eq!("submit".parse::<ShellCommand>(), Ok(ShellCommand::Submit));
        assert_eq!("q".parse::<ShellCommand>(), Ok(ShellCommand::Quit));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!("add".parse::<ShellCommand>().is_err());
        assert!("add color".parse::<ShellCommand>().is_err());
        assert!("rm 3".parse::<ShellCommand>().is_err());
        assert!("print".parse::<ShellCommand>().is_err());
    }
}
