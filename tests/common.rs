#![allow(dead_code)]

use std::{
    fs,
    io::Read,
    os::unix::net::UnixListener,
    path::{Path, PathBuf},
    process::Command,
    sync::mpsc,
    thread,
    time::Duration,
};

/// The binary under test, isolated from any user config.
pub fn sidecar(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sidecar-tui"));
    cmd.env("SIDECAR_TUI_CONFIG", dir.join("no-such-config.toml"))
        .env("RUST_LOG", "off");
    cmd
}

/// Write a config that keeps every socket inside `dir`.
pub fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    let body = format!(
        "[transport]\nsocket_path = \"{}\"\ninject_socket_path = \"{}\"\nretry_delay_ms = 50\n",
        dir.join("segment.sock").display(),
        dir.join("inject.sock").display(),
    );
    fs::write(&path, body).expect("write config");
    path
}

/// Accept connections on `path` and hand every complete payload to the
/// returned channel.
pub fn listen(path: &Path) -> mpsc::Receiver<String> {
    let listener = UnixListener::bind(path).expect("bind test listener");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { return };
            let mut payload = String::new();
            if stream.read_to_string(&mut payload).is_ok() && tx.send(payload).is_err() {
                return;
            }
        }
    });
    rx
}

pub fn recv(rx: &mpsc::Receiver<String>) -> serde_json::Value {
    let payload = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("no payload received");
    serde_json::from_str(&payload).expect("payload is JSON")
}
