//! Built-in commands
//!
//! Handled in the shell process itself, before anything is spawned.
//! Only single-stage pipelines are checked for builtins.

use crate::error::Result;
use crate::history::History;
use crate::session::ShellSession;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    History,
    Cd,
    Pwd,
    Prompt,
    Exit,
}

/// What the read-eval loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

impl Builtin {
    /// The builtin `argv` invokes, if any. `pwd` with arguments is left to
    /// the external program.
    pub fn lookup(argv: &[String]) -> Option<Self> {
        match argv.first()?.as_str() {
            "history" => Some(Builtin::History),
            "cd" => Some(Builtin::Cd),
            "pwd" if argv.len() == 1 => Some(Builtin::Pwd),
            "prompt" => Some(Builtin::Prompt),
            "exit" => Some(Builtin::Exit),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::History => "history",
            Builtin::Cd => "cd",
            Builtin::Pwd => "pwd",
            Builtin::Prompt => "prompt",
            Builtin::Exit => "exit",
        }
    }

    pub fn run(
        self,
        argv: &[String],
        session: &mut ShellSession,
        history: &History,
        out: &mut dyn Write,
    ) -> Result<Control> {
        let arg = argv.get(1).map(String::as_str);
        match self {
            Builtin::History => {
                write!(out, "{}", history.render())?;
            }
            Builtin::Cd => session.change_dir(arg)?,
            Builtin::Pwd => writeln!(out, "{}", session.cwd().display())?,
            Builtin::Prompt => {
                if let Some(text) = arg {
                    session.set_prompt(text);
                }
            }
            Builtin::Exit => return Ok(Control::Exit),
        }
        out.flush()?;
        Ok(Control::Continue)
    }
}
