mod common;

use common::MockFtpServer;
use rouilleftp::{CancellationToken, FtpError};

#[tokio::test]
async fn test_rename_resolves_relative_paths() {
    let server = MockFtpServer::start().await;
    server.add_file("/home/test/a.txt", b"data");
    let client = server.client().await;

    client
        .rename("a.txt", "b.txt", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        server.commands(),
        vec![
            "PWD",
            "PWD",
            "RNFR /home/test/a.txt",
            "RNTO /home/test/b.txt"
        ]
    );
    assert!(server.file("/home/test/a.txt").is_none());
    assert_eq!(server.file("/home/test/b.txt").unwrap(), b"data");
}

#[tokio::test]
async fn test_rename_absolute_paths_skip_pwd() {
    let server = MockFtpServer::start().await;
    server.add_file("/pub/a.txt", b"data");
    let client = server.client().await;

    client
        .rename("/pub//a.txt", "/pub/archive/a.txt", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(server.verbs(), vec!["RNFR", "RNTO"]);
    assert_eq!(server.commands()[0], "RNFR /pub/a.txt");
}

#[tokio::test]
async fn test_rename_prepare_failure_sends_no_commit() {
    let server = MockFtpServer::start().await;
    server.override_reply("RNFR", "550 File not found");
    let client = server.client().await;

    let err = client
        .rename("a.txt", "b.txt", &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.reply().map(|r| r.code), Some(550));
    assert_eq!(server.count("RNFR"), 1);
    assert_eq!(server.count("RNTO"), 0);
}

#[tokio::test]
async fn test_rename_commit_failure_surfaces_error() {
    let server = MockFtpServer::start().await;
    server.add_file("/home/test/a.txt", b"data");
    server.override_reply("RNTO", "553 Requested action not taken");
    let client = server.client().await;

    let err = client
        .rename("a.txt", "b.txt", &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.reply().map(|r| r.code), Some(553));
    assert!(server.commands().contains(&"RNFR /home/test/a.txt".to_string()));
    assert!(server.commands().contains(&"RNTO /home/test/b.txt".to_string()));
    // Nothing is rolled back.
    assert_eq!(server.verbs().last().map(String::as_str), Some("RNTO"));
    assert!(server.file("/home/test/a.txt").is_some());
}

#[tokio::test]
async fn test_rename_blank_arguments_rejected() {
    let server = MockFtpServer::start().await;
    let client = server.client().await;
    let token = CancellationToken::new();

    let err = client.rename("", "b.txt", &token).await.unwrap_err();
    assert!(matches!(err, FtpError::InvalidArgument("path")));

    let err = client.rename("a.txt", " ", &token).await.unwrap_err();
    assert!(matches!(err, FtpError::InvalidArgument("dest")));

    assert!(server.commands().is_empty());
}

#[tokio::test]
async fn test_pwd_failure_aborts_rename() {
    let server = MockFtpServer::start().await;
    server.override_reply("PWD", "550 Permission denied");
    let client = server.client().await;

    let err = client
        .rename("a.txt", "b.txt", &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.reply().map(|r| r.code), Some(550));
    assert_eq!(server.count("RNFR"), 0);
}
