#![allow(dead_code)]

use rouilleftp::core_network::PassiveMode;
use rouilleftp::{ClientConfig, FtpClient};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// A scripted FTP server that records every command it receives.
#[derive(Clone)]
pub struct MockFtpServer {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

struct MockState {
    trace: Mutex<Vec<String>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    overrides: Mutex<HashMap<String, String>>,
    cwd: String,
}

impl MockFtpServer {
    pub async fn start() -> Self {
        Self::start_in("/home/test").await
    }

    pub async fn start_in(cwd: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(MockState {
            trace: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
            overrides: Mutex::new(HashMap::new()),
            cwd: cwd.to_string(),
        });

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                let (socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let state = Arc::clone(&accept_state);
                tokio::spawn(async move {
                    let _ = handle_connection(socket, state).await;
                });
            }
        });

        Self { addr, state }
    }

    pub fn add_file(&self, path: &str, content: &[u8]) {
        self.state
            .files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.files.lock().unwrap().get(path).cloned()
    }

    /// Answers every `verb` with `reply` instead of the scripted behavior.
    pub fn override_reply(&self, verb: &str, reply: &str) {
        self.state
            .overrides
            .lock()
            .unwrap()
            .insert(verb.to_string(), reply.to_string());
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.trace.lock().unwrap().clone()
    }

    pub fn verbs(&self) -> Vec<String> {
        self.commands()
            .iter()
            .map(|line| line.split_whitespace().next().unwrap_or("").to_string())
            .collect()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.verbs().iter().filter(|v| *v == verb).count()
    }

    pub fn clear_trace(&self) {
        self.state.trace.lock().unwrap().clear();
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            username: "test".to_string(),
            password: "secret".to_string(),
            passive_mode: PassiveMode::Pasv,
            ..ClientConfig::default()
        }
    }

    /// Connects and logs in, then forgets the login commands.
    pub async fn client(&self) -> FtpClient {
        let client = FtpClient::connect(&self.config()).await.unwrap();
        self.clear_trace();
        client
    }
}

async fn send(socket: &mut TcpStream, line: &str) -> std::io::Result<()> {
    socket.write_all(format!("{}\r\n", line).as_bytes()).await
}

async fn handle_connection(socket: TcpStream, state: Arc<MockState>) -> std::io::Result<()> {
    let mut reader = BufReader::new(socket);
    send(reader.get_mut(), "220 Mock FTP ready").await?;

    let mut pasv: Option<TcpListener> = None;
    let mut restart: u64 = 0;
    let mut rename_from: Option<String> = None;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let command = line.trim_end().to_string();
        state.trace.lock().unwrap().push(command.clone());

        let (verb, arg) = match command.split_once(' ') {
            Some((verb, arg)) => (verb.to_ascii_uppercase(), arg.to_string()),
            None => (command.to_ascii_uppercase(), String::new()),
        };

        let forced = state.overrides.lock().unwrap().get(&verb).cloned();
        if let Some(reply) = forced {
            send(reader.get_mut(), &reply).await?;
            continue;
        }

        let socket = reader.get_mut();
        match verb.as_str() {
            "USER" => send(socket, "331 Password required").await?,
            "PASS" => send(socket, "230 Logged in").await?,
            "PWD" => send(socket, &format!("257 \"{}\" is the current directory", state.cwd)).await?,
            "TYPE" => send(socket, &format!("200 Type set to {}", arg)).await?,
            "NOOP" => send(socket, "200 NOOP ok").await?,
            "EPSV" => send(socket, "502 EPSV not implemented").await?,
            "SIZE" => {
                let size = state.files.lock().unwrap().get(&arg).map(|f| f.len());
                match size {
                    Some(size) => send(socket, &format!("213 {}", size)).await?,
                    None => send(socket, "550 No such file").await?,
                }
            }
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                let port = listener.local_addr()?.port();
                let ip = match listener.local_addr()?.ip() {
                    IpAddr::V4(v4) => v4.octets(),
                    IpAddr::V6(_) => [127, 0, 0, 1],
                };
                pasv = Some(listener);
                send(
                    socket,
                    &format!(
                        "227 Entering Passive Mode ({},{},{},{},{},{}).",
                        ip[0],
                        ip[1],
                        ip[2],
                        ip[3],
                        port / 256,
                        port % 256
                    ),
                )
                .await?
            }
            "REST" => match arg.parse::<u64>() {
                Ok(offset) => {
                    restart = offset;
                    send(socket, &format!("350 Restarting at {}", offset)).await?
                }
                Err(_) => send(socket, "501 Bad offset").await?,
            },
            "RETR" => {
                let content = state.files.lock().unwrap().get(&arg).cloned();
                let (Some(content), Some(listener)) = (content, pasv.take()) else {
                    send(socket, "550 No such file").await?;
                    continue;
                };
                send(socket, "150 Opening BINARY mode data connection").await?;
                let (mut data, _) = listener.accept().await?;
                let start = (restart as usize).min(content.len());
                data.write_all(&content[start..]).await?;
                data.shutdown().await?;
                restart = 0;
                send(socket, "226 Transfer complete").await?
            }
            "STOR" => {
                let Some(listener) = pasv.take() else {
                    send(socket, "425 Use PASV first").await?;
                    continue;
                };
                send(socket, "150 Ok to send data").await?;
                let (mut data, _) = listener.accept().await?;
                let mut content = Vec::new();
                data.read_to_end(&mut content).await?;
                state.files.lock().unwrap().insert(arg.clone(), content);
                send(socket, "226 Transfer complete").await?
            }
            "RNFR" => {
                let exists = state.files.lock().unwrap().contains_key(&arg);
                if exists {
                    rename_from = Some(arg.clone());
                    send(socket, "350 Ready for RNTO").await?
                } else {
                    send(socket, "550 No such file").await?
                }
            }
            "RNTO" => match rename_from.take() {
                Some(from) => {
                    {
                        let mut files = state.files.lock().unwrap();
                        if let Some(content) = files.remove(&from) {
                            files.insert(arg.clone(), content);
                        }
                    }
                    send(socket, "250 Rename successful").await?
                }
                None => send(socket, "503 Bad sequence of commands").await?,
            },
            "QUIT" => {
                send(socket, "221 Goodbye").await?;
                break;
            }
            _ => send(socket, "502 Command not implemented").await?,
        }
    }
    Ok(())
}
