use std::fmt;

/// Verbs the client sends over the control connection.
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    PWD,
    NOOP,
    RNFR,
    RNTO,
    RETR,
    STOR,
    REST,
    PASV,
    EPSV,
    SIZE,
    TYPE,
    AUTH,
    PBSZ,
    PROT,
}

impl FtpCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            FtpCommand::USER => "USER",
            FtpCommand::PASS => "PASS",
            FtpCommand::QUIT => "QUIT",
            FtpCommand::PWD => "PWD",
            FtpCommand::NOOP => "NOOP",
            FtpCommand::RNFR => "RNFR",
            FtpCommand::RNTO => "RNTO",
            FtpCommand::RETR => "RETR",
            FtpCommand::STOR => "STOR",
            FtpCommand::REST => "REST",
            FtpCommand::PASV => "PASV",
            FtpCommand::EPSV => "EPSV",
            FtpCommand::SIZE => "SIZE",
            FtpCommand::TYPE => "TYPE",
            FtpCommand::AUTH => "AUTH",
            FtpCommand::PBSZ => "PBSZ",
            FtpCommand::PROT => "PROT",
        }
    }
}

impl fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verb plus its argument, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: FtpCommand,
    arg: Option<String>,
}

impl Command {
    pub fn new(verb: FtpCommand, arg: impl Into<String>) -> Self {
        Self {
            verb,
            arg: Some(arg.into()),
        }
    }

    pub fn bare(verb: FtpCommand) -> Self {
        Self { verb, arg: None }
    }

    pub fn verb(&self) -> FtpCommand {
        self.verb
    }

    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }

    /// The line as it goes on the wire, without the CRLF terminator.
    pub fn to_line(&self) -> String {
        match &self.arg {
            Some(arg) => format!("{} {}", self.verb, arg),
            None => self.verb.to_string(),
        }
    }

    /// The line as it should appear in logs. Credentials are masked.
    pub fn to_log_line(&self) -> String {
        match (self.verb, &self.arg) {
            (FtpCommand::PASS, Some(_)) => "PASS ***".to_string(),
            _ => self.to_line(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_log_line())
    }
}
