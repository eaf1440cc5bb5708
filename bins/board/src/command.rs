//! Command line parsing for the interactive board.

use grievance_core::complaint::ComplaintForm;
use grievance_shared::types::ComplaintId;

/// Issue categories offered by the board.
pub const ISSUE_TYPES: [&str; 6] = [
    "plumbing",
    "electrical",
    "cleaning",
    "noise",
    "maintenance",
    "other",
];

pub const HELP: &str = "\
Commands:
  list                                              show all complaints
  attach <path>                                     stage an image or audio file
  files                                             show staged files
  unattach <n>                                      unstage file number n
  post <name>; <floor>; <flat>; <issue>[; <details>]  post a complaint with staged files
  resolve <id>                                      toggle resolved
  delete <id>                                       delete a complaint and its files
  test-storage                                      check file storage
  help                                              show this help
  quit | exit                                       leave the board

Issue types: plumbing, electrical, cleaning, noise, maintenance, other";

/// A parsed board command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Attach(String),
    Files,
    Unattach(usize),
    Post(ComplaintForm),
    Resolve(ComplaintId),
    Delete(ComplaintId),
    TestStorage,
    Help,
    Quit,
    Empty,
}

impl Command {
    /// Parses one input line.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

        match verb.to_ascii_lowercase().as_str() {
            "" => Ok(Self::Empty),
            "list" | "ls" => Ok(Self::List),
            "attach" => required(rest, "attach <path>").map(|p| Self::Attach(p.to_string())),
            "files" => Ok(Self::Files),
            "unattach" => {
                let n: usize = required(rest, "unattach <n>")?
                    .parse()
                    .map_err(|_| format!("'{rest}' is not a file number"))?;
                n.checked_sub(1)
                    .map(Self::Unattach)
                    .ok_or_else(|| "file numbers start at 1".to_string())
            }
            "post" => Ok(Self::Post(parse_form(rest))),
            "resolve" => required(rest, "resolve <id>").map(|id| Self::Resolve(ComplaintId::from(id))),
            "delete" | "rm" => required(rest, "delete <id>").map(|id| Self::Delete(ComplaintId::from(id))),
            "test-storage" => Ok(Self::TestStorage),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}', type 'help'")),
        }
    }
}

fn required<'a>(value: &'a str, usage: &str) -> Result<&'a str, String> {
    if value.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(value)
    }
}

/// Splits `name; floor; flat; issue; details` into form fields.
///
/// Missing parts stay empty so validation reports them.
fn parse_form(input: &str) -> ComplaintForm {
    let mut parts = input.splitn(5, ';').map(str::trim);
    let mut next = || parts.next().unwrap_or_default().to_string();

    ComplaintForm {
        student_name: next(),
        floor_number: next(),
        flat_number: next(),
        issue_type: next().to_ascii_lowercase(),
        description: next(),
    }
}
