use std::fmt;

/// A console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login {
        email: String,
        password: String,
    },
    Register {
        first_name: String,
        last_name: String,
        email: String,
        password: String,
        confirmation: String,
        department: Option<String>,
    },
    Logout,
    ForgotPassword {
        email: String,
    },
    /// Without a token, the one from the current reset link is used
    ResetPassword {
        email: String,
        token: Option<String>,
        password: String,
        confirmation: String,
    },
    ChangePassword {
        current: String,
        new: String,
        confirmation: String,
    },
    Go {
        path: String,
    },
    WhoAmI,
    Status,
    Search {
        query: String,
    },
    ClearError,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing was typed.
    Empty,
    /// Command is missing arguments.
    Usage(&'static str),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Type a command, or 'help' to see available commands"),
            Self::Usage(usage) => write!(f, "Usage: {usage}"),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

const LOGIN_USAGE: &str = "login EMAIL PASSWORD";
const REGISTER_USAGE: &str = "register FIRST LAST EMAIL PASSWORD CONFIRM [DEPARTMENT]";
const FORGOT_USAGE: &str = "forgot EMAIL";
const RESET_USAGE: &str = "reset EMAIL [TOKEN] PASSWORD CONFIRM";
const PASSWD_USAGE: &str = "passwd CURRENT NEW CONFIRM";
const GO_USAGE: &str = "go PATH";
const SEARCH_USAGE: &str = "search QUERY";

/// Help text listing every command
pub const HELP: &str = "\
Commands:
  login EMAIL PASSWORD                                   Log in
  register FIRST LAST EMAIL PASSWORD CONFIRM [DEPARTMENT] Create an account
  logout                                                 Log out everywhere
  forgot EMAIL                                           Email a password reset link
  reset EMAIL [TOKEN] PASSWORD CONFIRM                   Reset password (token from link if omitted)
  passwd CURRENT NEW CONFIRM                             Change password
  go PATH                                                Navigate, e.g. 'go /products'
  whoami                                                 Show the logged-in user
  status                                                 Show session and location
  search QUERY                                           Search the catalog
  clear                                                  Dismiss the last error
  help                                                   Show this help
  quit                                                   Exit
";

/// Parse a console line into a [`Command`].
///
/// # Examples
///
/// ```
/// use stockroom_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("logout"), Ok(Command::Logout));
/// assert_eq!(
///     parse_command("go /products"),
///     Ok(Command::Go { path: "/products".to_string() })
/// );
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    // Single-word commands first
    match trimmed {
        "" => return Err(ParseError::Empty),
        "logout" => return Ok(Command::Logout),
        "whoami" => return Ok(Command::WhoAmI),
        "status" => return Ok(Command::Status),
        "clear" => return Ok(Command::ClearError),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    let args = &parts[1..];
    match parts[0] {
        "login" => match args {
            [email, password] => Ok(Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            }),
            _ => Err(ParseError::Usage(LOGIN_USAGE)),
        },
        "register" => parse_register_command(args),
        "forgot" => match args {
            [email] => Ok(Command::ForgotPassword {
                email: email.to_string(),
            }),
            _ => Err(ParseError::Usage(FORGOT_USAGE)),
        },
        "reset" => parse_reset_command(args),
        "passwd" => match args {
            [current, new, confirmation] => Ok(Command::ChangePassword {
                current: current.to_string(),
                new: new.to_string(),
                confirmation: confirmation.to_string(),
            }),
            _ => Err(ParseError::Usage(PASSWD_USAGE)),
        },
        "go" => match args {
            [path] => Ok(Command::Go {
                path: path.to_string(),
            }),
            _ => Err(ParseError::Usage(GO_USAGE)),
        },
        "search" if !args.is_empty() => Ok(Command::Search {
            query: args.join(" "),
        }),
        "search" => Err(ParseError::Usage(SEARCH_USAGE)),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Parse "register FIRST LAST EMAIL PASSWORD CONFIRM [DEPARTMENT...]"
fn parse_register_command(args: &[&str]) -> Result<Command, ParseError> {
    match args {
        [first_name, last_name, email, password, confirmation, department @ ..] => {
            Ok(Command::Register {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                confirmation: confirmation.to_string(),
                department: (!department.is_empty()).then(|| department.join(" ")),
            })
        }
        _ => Err(ParseError::Usage(REGISTER_USAGE)),
    }
}

/// Parse "reset EMAIL [TOKEN] PASSWORD CONFIRM"
fn parse_reset_command(args: &[&str]) -> Result<Command, ParseError> {
    let (email, token, password, confirmation) = match args {
        [email, token, password, confirmation] => (email, Some(token), password, confirmation),
        [email, password, confirmation] => (email, None, password, confirmation),
        _ => return Err(ParseError::Usage(RESET_USAGE)),
    };
    Ok(Command::ResetPassword {
        email: email.to_string(),
        token: token.map(|token| token.to_string()),
        password: password.to_string(),
        confirmation: confirmation.to_string(),
    })
}
