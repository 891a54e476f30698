//! Command-line argument parsing for the aimeals CLI.

use crate::traits::Method;

/// Usage text printed by `--help` and on parse errors.
pub const USAGE: &str = "\
Usage: aimeals <command> [args]

Commands:
  login <email>                     Sign in (password is prompted)
  signup <email> <first> <last>     Create an account and sign in
  logout                            Forget the stored session
  status                            Show the stored session without contacting the server
  whoami                            Re-validate the stored session and show the user
  fetch <path> [--method M] [--data JSON]
                                    Call a protected API path, e.g. /meal-plans
  health                            Check that the backend is reachable

Options:
  -h, --help                        Show this help
  -V, --version                     Show version

Environment:
  AIMEALS_API_BASE_URL, AIMEALS_APP_HOST, AIMEALS_REQUEST_TIMEOUT_MS,
  AIMEALS_DATA_DIR, RUST_LOG";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Login {
        email: String,
    },
    Signup {
        email: String,
        first_name: String,
        last_name: String,
    },
    Logout,
    Status,
    Whoami,
    Fetch {
        path: String,
        method: Method,
        data: Option<String>,
    },
    Health,
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Arguments could not be parsed
    Usage(String),
}

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use aimeals::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["aimeals".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let args: Vec<String> = args.skip(1).collect();

    let Some((command, rest)) = args.split_first() else {
        return CliCommand::Help;
    };

    // Global flags only count before the subcommand; after it they are
    // ordinary arguments (e.g. a `--data` value).
    match command.as_str() {
        "--version" | "-V" => CliCommand::Version,
        "--help" | "-h" => CliCommand::Help,
        "login" => match rest {
            [email] => CliCommand::Login {
                email: email.clone(),
            },
            _ => usage("login takes exactly one argument: <email>"),
        },
        "signup" => match rest {
            [email, first_name, last_name] => CliCommand::Signup {
                email: email.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
            },
            _ => usage("signup takes <email> <first> <last>"),
        },
        "logout" => no_args(rest, CliCommand::Logout, "logout"),
        "status" => no_args(rest, CliCommand::Status, "status"),
        "whoami" => no_args(rest, CliCommand::Whoami, "whoami"),
        "health" => no_args(rest, CliCommand::Health, "health"),
        "fetch" => parse_fetch(rest),
        other => usage(&format!("unknown command '{}'", other)),
    }
}

fn usage(message: &str) -> CliCommand {
    CliCommand::Usage(message.to_string())
}

fn no_args(rest: &[String], command: CliCommand, name: &str) -> CliCommand {
    if rest.is_empty() {
        command
    } else {
        usage(&format!("{} takes no arguments", name))
    }
}

fn parse_fetch(rest: &[String]) -> CliCommand {
    let mut path = None;
    let mut method = None;
    let mut data = None;

    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--method" | "-X" => {
                let Some(name) = iter.next() else {
                    return usage("--method needs a value");
                };
                match Method::parse(name) {
                    Some(m) => method = Some(m),
                    None => return usage(&format!("unsupported method '{}'", name)),
                }
            }
            "--data" | "-d" => {
                let Some(body) = iter.next() else {
                    return usage("--data needs a value");
                };
                data = Some(body.clone());
            }
            flag if flag.starts_with('-') => {
                return usage(&format!("unknown option '{}'", flag));
            }
            positional => {
                if path.is_some() {
                    return usage("fetch takes a single <path>");
                }
                path = Some(positional.to_string());
            }
        }
    }

    let Some(path) = path else {
        return usage("fetch needs a <path>");
    };
    // A body without an explicit method is a POST.
    let method = method.unwrap_or(if data.is_some() {
        Method::Post
    } else {
        Method::Get
    });
    CliCommand::Fetch { path, method, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliCommand {
        let args: Vec<String> = std::iter::once("aimeals")
            .chain(args.iter().copied())
            .map(String::from)
            .collect();
        parse_args(args.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), CliCommand::Version);
        assert_eq!(parse(&["-V", "status"]), CliCommand::Version);
        assert!(matches!(parse(&["status", "-V"]), CliCommand::Usage(_)));
    }

    #[test]
    fn test_flags_after_subcommand_are_arguments() {
        assert_eq!(
            parse(&["fetch", "/x", "--data", "-h"]),
            CliCommand::Fetch {
                path: "/x".to_string(),
                method: Method::Post,
                data: Some("-h".to_string()),
            }
        );
        assert_eq!(
            parse(&["login", "--version"]),
            CliCommand::Login {
                email: "--version".to_string()
            }
        );
    }

    #[test]
    fn test_parse_no_args_is_help() {
        assert_eq!(parse(&[]), CliCommand::Help);
        assert_eq!(parse(&["-h"]), CliCommand::Help);
    }

    #[test]
    fn test_parse_login_and_signup() {
        assert_eq!(
            parse(&["login", "cook@example.com"]),
            CliCommand::Login {
                email: "cook@example.com".to_string()
            }
        );
        assert_eq!(
            parse(&["signup", "cook@example.com", "Ada", "Cook"]),
            CliCommand::Signup {
                email: "cook@example.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Cook".to_string(),
            }
        );
        assert!(matches!(parse(&["login"]), CliCommand::Usage(_)));
        assert!(matches!(parse(&["signup", "a@b.c"]), CliCommand::Usage(_)));
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse(&["logout"]), CliCommand::Logout);
        assert_eq!(parse(&["status"]), CliCommand::Status);
        assert_eq!(parse(&["whoami"]), CliCommand::Whoami);
        assert_eq!(parse(&["health"]), CliCommand::Health);
        assert!(matches!(parse(&["logout", "now"]), CliCommand::Usage(_)));
    }

    #[test]
    fn test_parse_fetch() {
        assert_eq!(
            parse(&["fetch", "/meal-plans"]),
            CliCommand::Fetch {
                path: "/meal-plans".to_string(),
                method: Method::Get,
                data: None,
            }
        );
        assert_eq!(
            parse(&["fetch", "/recipes", "--data", r#"{"q":"soup"}"#]),
            CliCommand::Fetch {
                path: "/recipes".to_string(),
                method: Method::Post,
                data: Some(r#"{"q":"soup"}"#.to_string()),
            }
        );
        assert_eq!(
            parse(&["fetch", "--method", "delete", "/meal-plans/3"]),
            CliCommand::Fetch {
                path: "/meal-plans/3".to_string(),
                method: Method::Delete,
                data: None,
            }
        );
    }

    #[test]
    fn test_parse_fetch_errors() {
        assert!(matches!(parse(&["fetch"]), CliCommand::Usage(_)));
        assert!(matches!(parse(&["fetch", "/a", "/b"]), CliCommand::Usage(_)));
        assert!(matches!(parse(&["fetch", "/a", "--method"]), CliCommand::Usage(_)));
        assert!(matches!(parse(&["fetch", "/a", "--method", "TRACE"]), CliCommand::Usage(_)));
        assert!(matches!(parse(&["fetch", "/a", "--verbose"]), CliCommand::Usage(_)));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            parse(&["plan"]),
            CliCommand::Usage("unknown command 'plan'".to_string())
        );
    }
}
