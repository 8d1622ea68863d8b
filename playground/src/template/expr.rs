//! Parser for `{{ ... }}` expressions embedded in service strings.

use crate::error::{ManifestError, Result};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A deferred value carried inside a templated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `{{Port "name" default}}`: a port of the current service.
    Port {
        /// Logical port name.
        name: String,
        /// Requested value.
        default: u16,
    },
    /// `{{Addr "name" default}}`: a bind-all listen address of the current service.
    Addr {
        /// Logical port name.
        name: String,
        /// Requested value.
        default: u16,
    },
    /// `{{Dir}}`: the run's output directory.
    Dir,
    /// `{{Connect "service" "port" ["scheme"]}}`: another service's internal address.
    Connect {
        /// Target service name.
        service: String,
        /// Target logical port name.
        port: String,
        /// URL scheme. Empty renders a bare `host:port`.
        scheme: String,
    },
}

/// A piece of a parsed string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied verbatim.
    Literal(&'a str),
    /// An expression to substitute.
    Expr(Expr),
}

/// Splits `input` into literal text and expressions.
pub fn parse(input: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }
        let body_start = start + OPEN.len();
        let Some(len) = rest[body_start..].find(CLOSE) else {
            return Err(invalid(input, "unterminated '{{'"));
        };
        let body = &rest[body_start..body_start + len];
        segments.push(Segment::Expr(parse_expr(input, body)?));
        rest = &rest[body_start + len + CLOSE.len()..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }

    Ok(segments)
}

/// Returns the expressions contained in `input`.
pub fn expressions(input: &str) -> Result<Vec<Expr>> {
    Ok(parse(input)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Expr(expr) => Some(expr),
            Segment::Literal(_) => None,
        })
        .collect())
}

fn parse_expr(input: &str, body: &str) -> Result<Expr> {
    let tokens = tokenize(input, body)?;
    let Some((func, args)) = tokens.split_first() else {
        return Err(invalid(input, "empty expression"));
    };

    match (func.as_str(), args) {
        ("Port", [name, default]) => {
            Ok(Expr::Port { name: name.clone(), default: parse_port(input, default)? })
        }
        ("Addr", [name, default]) => {
            Ok(Expr::Addr { name: name.clone(), default: parse_port(input, default)? })
        }
        ("Dir", []) => Ok(Expr::Dir),
        ("Connect", [service, port]) => Ok(Expr::Connect {
            service: service.clone(),
            port: port.clone(),
            scheme: "http".to_string(),
        }),
        ("Connect", [service, port, scheme]) => Ok(Expr::Connect {
            service: service.clone(),
            port: port.clone(),
            scheme: scheme.clone(),
        }),
        ("Port" | "Addr" | "Dir" | "Connect", _) => {
            Err(invalid(input, format!("wrong number of arguments for {func}")))
        }
        _ => Err(invalid(input, format!("unknown function '{func}'"))),
    }
}

/// Splits an expression body on whitespace, honoring double quotes.
fn tokenize(input: &str, body: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = body.trim().chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(c) => token.push(c),
                    None => return Err(invalid(input, "unterminated string literal")),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

/// Accepts `8545` or `0.0.0.0:8545`.
fn parse_port(input: &str, token: &str) -> Result<u16> {
    let raw = token.rsplit_once(':').map_or(token, |(_, port)| port);
    raw.parse().map_err(|_| invalid(input, format!("'{token}' is not a port number")))
}

fn invalid(input: &str, reason: impl Into<String>) -> ManifestError {
    ManifestError::InvalidExpression { input: input.to_string(), reason: reason.into() }
}
