mod common;

use common::MockFtpServer;
use rouilleftp::blocking::BlockingFtpClient;
use rouilleftp::{FtpDataType, LengthHint};
use std::io::{Read, Write};

fn server_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn test_blocking_download_and_upload() {
    let runtime = server_runtime();
    let server = runtime.block_on(MockFtpServer::start());
    server.add_file("/pub/a.bin", b"blocking payload");

    let client = BlockingFtpClient::connect(&server.config()).unwrap();
    server.clear_trace();

    let mut stream = client
        .open_read("/pub/a.bin", FtpDataType::Binary, 9, LengthHint::Unknown)
        .unwrap()
        .expect("data channel");
    assert_eq!(stream.length(), Some(16));
    assert_eq!(stream.position(), 9);

    let mut content = Vec::new();
    stream.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"payload");
    assert_eq!(stream.position(), 16);
    assert_eq!(client.finish_transfer(stream).unwrap().code, 226);

    let mut stream = client
        .open_write("/pub/b.bin", FtpDataType::Binary, LengthHint::Irrelevant)
        .unwrap()
        .expect("data channel");
    stream.write_all(b"uploaded").unwrap();
    stream.flush().unwrap();
    assert_eq!(client.finish_transfer(stream).unwrap().code, 226);
    assert_eq!(server.file("/pub/b.bin").unwrap(), b"uploaded");

    assert_eq!(
        server.verbs(),
        vec!["SIZE", "TYPE", "PASV", "REST", "RETR", "TYPE", "PASV", "STOR"]
    );
    assert!(!client.session_state().ignore_stale_data);
    client.quit().unwrap();
}

#[test]
fn test_blocking_rename_and_size() {
    let runtime = server_runtime();
    let server = runtime.block_on(MockFtpServer::start());
    server.add_file("/home/test/a.txt", b"12345");

    let client = BlockingFtpClient::connect(&server.config()).unwrap();
    assert_eq!(client.file_size("/home/test/a.txt").unwrap(), 5);

    client.rename("a.txt", "b.txt").unwrap();
    assert!(server.file("/home/test/b.txt").is_some());

    let err = client.rename("missing.txt", "c.txt").unwrap_err();
    assert_eq!(err.reply().map(|r| r.code), Some(550));
    client.quit().unwrap();
}
