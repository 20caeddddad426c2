// CLI integration tests for the client subcommands and error output.
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use bookshelf::api::RemoteClient;
use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_bookshelf");
    Command::new(exe)
}

fn parse_json(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().next().expect("json line");
    serde_json::from_str(line).expect("valid json")
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr").port()
}

struct ServerGuard(Child);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn start_server() -> (ServerGuard, String) {
    let port = free_port();
    let bind = format!("127.0.0.1:{port}");
    let child = cmd()
        .args(["serve", "--bind", &bind, "--list-step-ms", "0", "--save-scale-ms", "0"])
        .env("RUST_LOG", "warn")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn server");
    let guard = ServerGuard(child);
    let url = format!("http://{bind}");
    let start = Instant::now();
    let client = RemoteClient::new(url.clone()).expect("client");
    while client.health().is_err() {
        assert!(start.elapsed() < Duration::from_secs(8), "server did not start");
        sleep(Duration::from_millis(20));
    }
    (guard, url)
}

#[test]
fn add_rename_list_save_flow() {
    let (_server, url) = start_server();

    let add = cmd().args(["--url", &url, "add", "Dune"]).output().expect("add");
    assert!(add.status.success());
    assert_eq!(parse_json(&add.stdout)["success"], true);

    let rename = cmd()
        .args(["--url", &url, "rename", "Dune", "Dune Messiah"])
        .output()
        .expect("rename");
    assert!(rename.status.success());

    let list = cmd().args(["--url", &url, "list"]).output().expect("list");
    assert!(list.status.success());
    assert_eq!(parse_json(&list.stdout)["library"], "Dune Messiah");

    let save = cmd().args(["--url", &url, "save"]).output().expect("save");
    assert!(save.status.success());
    let saved = parse_json(&save.stdout);
    assert!(saved["Dune Messiah"].is_u64());
}

#[test]
fn duplicate_add_exits_with_error_json() {
    let (_server, url) = start_server();

    let first = cmd().args(["--url", &url, "add", "Emma"]).output().expect("add");
    assert!(first.status.success());

    let second = cmd().args(["--url", &url, "add", "Emma"]).output().expect("add");
    assert_eq!(second.status.code(), Some(4));
    let err = parse_json(&second.stderr);
    assert_eq!(err["error"]["kind"], "DuplicateEntry");
    assert_eq!(err["error"]["message"], "Duplicate book title");
}

#[test]
fn unreachable_server_is_io_error() {
    let url = format!("http://127.0.0.1:{}", free_port());
    let output = cmd().args(["--url", &url, "list"]).output().expect("list");
    assert_eq!(output.status.code(), Some(6));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Io");
}

#[test]
fn serve_rejects_non_loopback_without_flag() {
    let output = cmd()
        .args(["serve", "--bind", "0.0.0.0:0"])
        .output()
        .expect("serve");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
    assert!(err["error"]["hint"].is_string());
}

#[test]
fn unknown_flag_is_usage_error() {
    let output = cmd().args(["list", "--nope"]).output().expect("run");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
}
