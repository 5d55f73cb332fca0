//! Line-oriented interactive session

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use rettam_store::Session;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::client::ApiClient;
use crate::commands::{self, GraphFormat};

const HELP: &str = "\
Commands:
  new [name]                      create and select an exploration
  select <name>                   select an exploration
  delete                          delete the selected exploration
  clear                           delete every exploration
  process <text>                  extract metadata for the selected exploration
  toggle entities|dependencies    show or hide a graph layer
  graph <path>                    write the selected graph as HTML
  list                            list explorations
  help                            show this message
  quit                            leave the shell";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Entities,
    Dependencies,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    New(Option<String>),
    Select(String),
    Delete,
    Clear,
    Process(String),
    Toggle(Layer),
    Graph(PathBuf),
    List,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "new" => ShellCommand::New((!rest.is_empty()).then(|| rest.to_string())),
            "select" if !rest.is_empty() => ShellCommand::Select(rest.to_string()),
            "delete" => ShellCommand::Delete,
            "clear" => ShellCommand::Clear,
            "process" if !rest.is_empty() => ShellCommand::Process(rest.to_string()),
            "toggle" => match rest {
                "entities" => ShellCommand::Toggle(Layer::Entities),
                "dependencies" => ShellCommand::Toggle(Layer::Dependencies),
                other => bail!("unknown layer '{other}', expected entities or dependencies"),
            },
            "graph" if !rest.is_empty() => ShellCommand::Graph(PathBuf::from(rest)),
            "list" => ShellCommand::List,
            "help" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            "select" | "process" | "graph" => bail!("'{word}' needs an argument"),
            other => bail!("unknown command '{other}', try 'help'"),
        };
        Ok(Some(command))
    }
}

/// Read commands from `input` until `quit` or end of input
pub async fn run<R>(
    session: &mut Session,
    client: &ApiClient,
    input: R,
    out: &mut dyn Write,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        write!(out, "rettam [{}]> ", session.current_name().unwrap_or("-"))?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "error: {e}")?;
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }
        if let Err(e) = execute(session, client, command, out).await {
            writeln!(out, "error: {e:#}")?;
        }
    }
    Ok(())
}

async fn execute(
    session: &mut Session,
    client: &ApiClient,
    command: ShellCommand,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        ShellCommand::New(name) => commands::create(session, name.as_deref(), out),
        ShellCommand::Select(name) => {
            session.select(&name)?;
            writeln!(out, "Selected {name}")?;
            Ok(())
        }
        ShellCommand::Delete => match session.delete_current()? {
            Some(name) => {
                writeln!(out, "Deleted {name}")?;
                Ok(())
            }
            None => Err(anyhow!("no exploration selected")),
        },
        ShellCommand::Clear => commands::clear(session, out),
        ShellCommand::Process(text) => commands::process_current(session, client, &text, out).await,
        ShellCommand::Toggle(Layer::Entities) => {
            let show = !session.show_entities();
            session.set_show_entities(show);
            writeln!(out, "Entities {}", if show { "shown" } else { "hidden" })?;
            Ok(())
        }
        ShellCommand::Toggle(Layer::Dependencies) => {
            let show = !session.show_dependencies();
            session.set_show_dependencies(show);
            writeln!(out, "Dependencies {}", if show { "shown" } else { "hidden" })?;
            Ok(())
        }
        ShellCommand::Graph(path) => {
            let name = session
                .current_name()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("no exploration selected"))?;
            let html = commands::render_graph(session, &name, GraphFormat::Html)?;
            std::fs::write(&path, html)?;
            writeln!(out, "Wrote {}", path.display())?;
            Ok(())
        }
        ShellCommand::List => commands::list(session, out),
        ShellCommand::Help => {
            writeln!(out, "{HELP}")?;
            Ok(())
        }
        ShellCommand::Quit => Ok(()),
    }
}
