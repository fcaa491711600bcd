use anyhow::{Context, bail};

pub const USAGE: &str = "\
Usage:
    sanetrace decode  [--json] [--config PATH] [--port N] [--passes N] TRANSCRIPT
    sanetrace summary [--config PATH] [--port N] TRANSCRIPT
    sanetrace check   [--config PATH] TRANSCRIPT
";

struct ArgParser<'a> {
    args: std::slice::Iter<'a, String>,
    value: Option<&'a str>,
}

#[derive(Debug)]
enum Component<'a> {
    Flags(&'a str),
    Long(&'a str),
    Value(&'a str),
    Term(&'a str),
}

impl<'a> ArgParser<'a> {
    fn new(args: &'a [String]) -> ArgParser<'a> {
        ArgParser { args: args.iter(), value: None }
    }

    /// Value of a long flag, given either as `--flag=value` or as the next
    /// argument.
    fn flag_value(&mut self, flag: &str) -> anyhow::Result<&'a str> {
        match self.next() {
            Some(Component::Value(value) | Component::Term(value)) => Ok(value),
            _ => bail!("Flag --{} requires a value", flag),
        }
    }
}

impl<'a> Iterator for ArgParser<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(value) = self.value.take() {
            return Some(Component::Value(value));
        }
        let arg = self.args.next()?;

        if let Some(long_or_pair) = arg.strip_prefix("--") {
            if let Some((long, value)) = long_or_pair.split_once("=") {
                self.value = Some(value);
                return Some(Component::Long(long));
            }
            return Some(Component::Long(long_or_pair));
        }

        if let Some(flags) = arg.strip_prefix("-") {
            return Some(Component::Flags(flags));
        }

        Some(Component::Term(arg))
    }
}

/// Options shared by every command; `port` and `passes` override the
/// config file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GlobalArguments<'a> {
    pub config: Option<&'a str>,
    pub port: Option<u16>,
    pub passes: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Decode { transcript: &'a str, json: bool },
    Summary { transcript: &'a str },
    Check { transcript: &'a str },
    Help,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Decode,
    Summary,
    Check,
}

impl CommandKind {
    fn name(self) -> &'static str {
        match self {
            CommandKind::Decode => "decode",
            CommandKind::Summary => "summary",
            CommandKind::Check => "check",
        }
    }

    fn accepts(self, flag: &str) -> bool {
        match flag {
            "config" => true,
            "port" => self != CommandKind::Check,
            "passes" | "json" => self == CommandKind::Decode,
            _ => false,
        }
    }
}

fn parse_command<'a>(
    kind: CommandKind,
    parser: &mut ArgParser<'a>,
    global: &mut GlobalArguments<'a>,
) -> anyhow::Result<Command<'a>> {
    let mut transcript = None;
    let mut json = false;
    while let Some(component) = parser.next() {
        match component {
            Component::Term(arg) => {
                if transcript.is_some() {
                    bail!("Unexpected argument: {:?}", arg);
                }
                transcript = Some(arg);
            }
            Component::Long(long) => {
                if !kind.accepts(long) {
                    bail!("Unknown flag --{} in {} command", long, kind.name());
                }
                match long {
                    "json" => json = true,
                    "config" => global.config = Some(parser.flag_value(long)?),
                    "port" => {
                        let value = parser.flag_value(long)?;
                        global.port = Some(value.parse().with_context(|| format!("Invalid port: {value:?}"))?);
                    }
                    "passes" => {
                        let value = parser.flag_value(long)?;
                        let passes: u32 = value.parse().with_context(|| format!("Invalid pass count: {value:?}"))?;
                        if passes == 0 {
                            bail!("--passes must be at least 1");
                        }
                        global.passes = Some(passes);
                    }
                    other => bail!("Unknown flag --{}", other),
                }
            }
            Component::Flags(flags) => {
                if let Some(flag) = flags.chars().next() {
                    bail!("Unknown flag -{}", flag);
                }
            }
            Component::Value(value) => {
                bail!("Unexpected value: {:?}", value);
            }
        }
    }
    let Some(transcript) = transcript else {
        bail!("Missing transcript path for {} command", kind.name());
    };
    Ok(match kind {
        CommandKind::Decode => Command::Decode { transcript, json },
        CommandKind::Summary => Command::Summary { transcript },
        CommandKind::Check => Command::Check { transcript },
    })
}

pub fn parse<'a>(args: &'a [String]) -> anyhow::Result<(GlobalArguments<'a>, Command<'a>)> {
    let mut parser = ArgParser::new(args);
    let mut global = GlobalArguments::default();

    let kind = match parser.next() {
        None => return Ok((global, Command::Help)),
        Some(Component::Term("decode")) => CommandKind::Decode,
        Some(Component::Term("summary")) => CommandKind::Summary,
        Some(Component::Term("check")) => CommandKind::Check,
        Some(Component::Term("help") | Component::Long("help") | Component::Flags("h")) => {
            return Ok((global, Command::Help));
        }
        Some(Component::Term(unknown)) => bail!("Unknown Command: {:?}", unknown),
        Some(other) => bail!("Expected a command, found {:?}", other),
    };
    let command = parse_command(kind, &mut parser, &mut global)?;
    Ok((global, command))
}
