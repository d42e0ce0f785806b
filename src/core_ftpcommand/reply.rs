use crate::core_ftpcommand::error::FtpError;
use std::fmt;

/// A server reply terminating one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpReply {
    pub code: u16,
    pub message: String,
    /// Lines preceding the final line of a multi-line reply.
    pub info: Vec<String>,
}

impl FtpReply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            info: Vec::new(),
        }
    }

    /// Positive preliminary (1xx), completion (2xx) and intermediate (3xx)
    /// replies are successes. RNFR and REST answer 350.
    pub fn is_success(&self) -> bool {
        (100..400).contains(&self.code)
    }

    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }
}

impl fmt::Display for FtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// Result of feeding one line to a [`ReplyParser`].
#[derive(Debug)]
pub enum ParseStep {
    NeedMore,
    Done(FtpReply),
}

/// Accumulates control-connection lines until a complete reply is seen.
///
/// A single-line reply is `ddd text`. A multi-line reply opens with `ddd-text`
/// and ends at the first line starting with the same code followed by a space.
#[derive(Debug, Default)]
pub struct ReplyParser {
    code: Option<u16>,
    info: Vec<String>,
}

impl ReplyParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, raw: &str) -> Result<ParseStep, FtpError> {
        let line = raw.trim_end_matches(['\r', '\n']);

        if let Some(code) = self.code {
            if let Some((c, sep, text)) = split_status(line) {
                if c == code && sep == ' ' {
                    let info = std::mem::take(&mut self.info);
                    self.code = None;
                    return Ok(ParseStep::Done(FtpReply {
                        code,
                        message: text.to_string(),
                        info,
                    }));
                }
            }
            self.info.push(line.to_string());
            return Ok(ParseStep::NeedMore);
        }

        match split_status(line) {
            Some((code, ' ', text)) => Ok(ParseStep::Done(FtpReply::new(code, text))),
            Some((code, '-', text)) => {
                self.code = Some(code);
                self.info.push(text.to_string());
                Ok(ParseStep::NeedMore)
            }
            _ => Err(FtpError::MalformedReply(line.to_string())),
        }
    }
}

fn split_status(line: &str) -> Option<(u16, char, &str)> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let code: u16 = line[..3].parse().ok()?;
    match bytes.get(3) {
        None => Some((code, ' ', "")),
        Some(b' ') => Some((code, ' ', &line[4..])),
        Some(b'-') => Some((code, '-', &line[4..])),
        _ => None,
    }
}
