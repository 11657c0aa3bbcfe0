//! IRC line parsing and command builders (RFC 1459 subset).

use crate::common::error::ProtocolError;

/// Maximum bytes of text per PRIVMSG, leaving room for prefix and target.
pub const MAX_PRIVMSG_TEXT: usize = 400;

/// One parsed IRC protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcLine {
    /// `nick!user@host` or server name, without the leading `:`.
    pub prefix: Option<String>,
    pub command: String,
    /// Middle params followed by the trailing param, if any.
    pub params: Vec<String>,
}

impl IrcLine {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, tail) = stripped.split_once(' ').ok_or_else(|| invalid(line))?;
                rest = tail.trim_start();
                Some(prefix.to_string())
            }
            None => None,
        };

        let (command, mut rest) = match rest.split_once(' ') {
            Some((command, tail)) => (command, tail),
            None => (rest, ""),
        };
        if command.is_empty() {
            return Err(invalid(line));
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((param, tail)) => {
                    params.push(param.to_string());
                    rest = tail;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Ok(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Nick part of the prefix.
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split(['!', '@']).next().unwrap_or(prefix))
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

fn invalid(line: &str) -> ProtocolError {
    ProtocolError::InvalidLine {
        message: line.to_string(),
    }
}

pub fn nick(nick: &str) -> String {
    format!("NICK {}", nick)
}

pub fn user(nick: &str, realname: &str) -> String {
    format!("USER {} 0 * :{}", nick, realname)
}

pub fn join(channel: &str) -> String {
    format!("JOIN {}", channel)
}

pub fn pong(token: &str) -> String {
    format!("PONG :{}", token)
}

pub fn quit(reason: &str) -> String {
    format!("QUIT :{}", reason)
}

/// PRIVMSG lines for `text`: one per line of text, long lines split on
/// character boundaries.
///
/// CR, LF and NUL never reach the wire; CR and LF end a line.
pub fn privmsg(target: &str, text: &str) -> Vec<String> {
    text.split(['\r', '\n'])
        .map(|line| line.replace('\0', ""))
        .filter(|line| !line.trim().is_empty())
        .flat_map(|line| {
            chunk(&line, MAX_PRIVMSG_TEXT)
                .into_iter()
                .map(|chunk| format!("PRIVMSG {} :{}", target, chunk))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn chunk(line: &str, max_bytes: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = line;
    while rest.len() > max_bytes {
        let mut split = max_bytes;
        while !rest.is_char_boundary(split) {
            split -= 1;
        }
        let (head, tail) = rest.split_at(split);
        chunks.push(head);
        rest = tail;
    }
    chunks.push(rest);
    chunks
}
