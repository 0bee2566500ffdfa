//! Line commands read from stdin.
//!
//! Lines starting with `:` are control commands; any other line replaces the
//! typing input content.

use crate::error::CommandError;
use crate::skeleton::Side;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Focus,
    Blur,
    Clear,
    Input(String),
    /// Re-apply the static pose
    Pose,
    Arms { down: f32, forward: f32 },
    LowerArm { side: Side, x: f32, y: f32, z: f32 },
    Hand { side: Side, x: f32, y: f32, z: f32 },
    Sync,
    Dump,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Command::Input(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match name {
            "focus" => no_args(name, &args, Command::Focus),
            "blur" => no_args(name, &args, Command::Blur),
            "clear" => no_args(name, &args, Command::Clear),
            "pose" => no_args(name, &args, Command::Pose),
            "sync" => no_args(name, &args, Command::Sync),
            "dump" => no_args(name, &args, Command::Dump),
            "quit" | "q" => no_args(name, &args, Command::Quit),
            "arms" => {
                arity(name, &args, 2)?;
                Ok(Command::Arms {
                    down: number(args[0])?,
                    forward: number(args[1])?,
                })
            }
            "lower" | "hand" => {
                arity(name, &args, 4)?;
                let side: Side = args[0].parse()?;
                let (x, y, z) = (number(args[1])?, number(args[2])?, number(args[3])?);
                Ok(if name == "lower" {
                    Command::LowerArm { side, x, y, z }
                } else {
                    Command::Hand { side, x, y, z }
                })
            }
            _ => Err(CommandError::Unknown(line.to_string())),
        }
    }
}

fn arity(command: &str, args: &[&str], expected: usize) -> Result<(), CommandError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(CommandError::Arity {
            command: command.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn no_args(command: &str, args: &[&str], parsed: Command) -> Result<Command, CommandError> {
    arity(command, args, 0).map(|_| parsed)
}

fn number(s: &str) -> Result<f32, CommandError> {
    s.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError::InvalidNumber(s.to_string()))
}
