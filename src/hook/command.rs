// Command descriptors
//
// Read-only view of one Redis command as the hook sees it: the argument list
// (name first) and, once executed, the error it failed with. Nil replies are
// not errors.

use std::fmt;

/// One Redis command and its outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    args: Vec<Vec<u8>>,
    error: Option<String>,
}

impl Command {
    /// Build a command from its arguments, name first
    pub fn new<I, A>(args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Vec<u8>>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            error: None,
        }
    }

    /// Record the error the command failed with
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Command name, uppercased (empty for a command without arguments)
    pub fn name(&self) -> String {
        self.args
            .first()
            .map(|name| String::from_utf8_lossy(name).to_uppercase())
            .unwrap_or_default()
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl From<&redis::Cmd> for Command {
    fn from(cmd: &redis::Cmd) -> Self {
        let args = cmd.args_iter().map(|arg| match arg {
            redis::Arg::Simple(bytes) => bytes.to_vec(),
            // Cursor-based commands (SCAN family) start from cursor 0
            _ => b"0".to_vec(),
        });
        Self::new(args)
    }
}

/// Arguments separated by single spaces, bytes rendered as lossy UTF-8
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}

/// Display adapter for a pipeline: commands in execution order, `"; "` separated
#[derive(Debug, Clone, Copy)]
pub struct PipelineDisplay<'a>(pub &'a [Command]);

impl fmt::Display for PipelineDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", cmd)?;
        }
        Ok(())
    }
}

/// Render a pipeline as a single string
pub fn render_pipeline(cmds: &[Command]) -> String {
    PipelineDisplay(cmds).to_string()
}

/// Describe every command queued on a pipeline, in order
pub fn pipeline_commands(pipeline: &redis::Pipeline) -> Vec<Command> {
    pipeline.cmd_iter().map(Command::from).collect()
}
