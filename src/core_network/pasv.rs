use crate::core_ftpcommand::error::FtpError;
use crate::core_ftpcommand::ftpcommand::{Command, FtpCommand};
use crate::core_ftpcommand::reply::FtpReply;
use crate::core_network::control::ControlConnection;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;

/// How the client asks the server for a data port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PassiveMode {
    /// `PASV` only.
    Pasv,
    /// `EPSV`, falling back to `PASV` when the server refuses it.
    #[default]
    Epsv,
}

fn pasv_regex() -> &'static Regex {
    static PASV: OnceLock<Regex> = OnceLock::new();
    PASV.get_or_init(|| {
        Regex::new(r"(\d{1,3}),\s*(\d{1,3}),\s*(\d{1,3}),\s*(\d{1,3}),\s*(\d{1,3}),\s*(\d{1,3})")
            .unwrap()
    })
}

fn epsv_regex() -> &'static Regex {
    static EPSV: OnceLock<Regex> = OnceLock::new();
    EPSV.get_or_init(|| Regex::new(r"\(\|\|\|(\d{1,5})\|\)").unwrap())
}

/// Parses `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`.
pub fn parse_pasv_reply(reply: &FtpReply) -> Result<SocketAddr, FtpError> {
    let malformed = || FtpError::MalformedReply(reply.to_string());
    let caps = pasv_regex().captures(&reply.message).ok_or_else(malformed)?;

    let mut parts = [0u8; 6];
    for (i, part) in parts.iter_mut().enumerate() {
        *part = caps[i + 1].parse().map_err(|_| malformed())?;
    }

    let ip = Ipv4Addr::new(parts[0], parts[1], parts[2], parts[3]);
    let port = (parts[4] as u16) << 8 | parts[5] as u16;
    Ok(SocketAddr::new(IpAddr::V4(ip), port))
}

/// Parses `229 Entering Extended Passive Mode (|||port|)`.
pub fn parse_epsv_reply(reply: &FtpReply) -> Result<u16, FtpError> {
    let caps = epsv_regex()
        .captures(&reply.message)
        .ok_or_else(|| FtpError::MalformedReply(reply.to_string()))?;
    caps[1]
        .parse()
        .map_err(|_| FtpError::MalformedReply(reply.to_string()))
}

fn is_unroutable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_unspecified() || v4.is_private() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_unspecified(),
    }
}

/// Picks the address to dial for a PASV reply. Servers behind NAT often
/// announce an internal address; the control peer is used instead.
pub fn resolve_pasv_target(announced: SocketAddr, peer: Option<SocketAddr>) -> SocketAddr {
    match peer {
        Some(peer)
            if announced.ip().is_unspecified()
                || (is_unroutable(&announced.ip()) && !is_unroutable(&peer.ip())) =>
        {
            if announced.ip() != peer.ip() {
                info!(
                    "Server announced {} for passive mode, using control peer {} instead",
                    announced.ip(),
                    peer.ip()
                );
            }
            SocketAddr::new(peer.ip(), announced.port())
        }
        _ => announced,
    }
}

/// Asks the server for a passive data port and returns where to connect.
pub async fn negotiate_passive(
    control: &mut ControlConnection,
    mode: PassiveMode,
    token: &CancellationToken,
) -> Result<SocketAddr, FtpError> {
    if mode == PassiveMode::Epsv {
        if let Some(peer) = control.peer_addr() {
            let reply = control
                .send_command(&Command::bare(FtpCommand::EPSV), token)
                .await?;
            if reply.code == 229 {
                let port = parse_epsv_reply(&reply)?;
                debug!("EPSV data port {} on {}", port, peer.ip());
                return Ok(SocketAddr::new(peer.ip(), port));
            }
            debug!("EPSV refused ({}), falling back to PASV", reply);
        }
    }

    let reply = control
        .execute(&Command::bare(FtpCommand::PASV), token)
        .await?;
    let announced = parse_pasv_reply(&reply)?;
    let target = resolve_pasv_target(announced, control.peer_addr());
    debug!("PASV data address {}", target);
    Ok(target)
}
