#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::Command;

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_i2cserial"));
    command
        .env_remove("I2CSERIAL_DEVICE")
        .env_remove("I2CSERIAL_BAUD")
        .env_remove("I2CSERIAL_TIMEOUT")
        .env_remove("I2CSERIAL_LOG")
        .arg("--log-level")
        .arg("off");
    command
}

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/i2cserial-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

#[test]
fn version_prints_package_version() {
    let output = cli().arg("version").output().expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("i2cserial {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_reports_protocol_defaults() {
    let output = cli()
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: i2cserial"));
    assert!(stdout.contains("escape=0x1b"));
    assert!(stdout.contains("profile: "));
    assert!(stdout.contains("log_env: I2CSERIAL_LOG"));
}

#[test]
fn module_directives_refine_log_level() {
    let output = cli()
        .env("I2CSERIAL_LOG", "i2cserial::cmd=debug")
        .arg("probe")
        .arg("/dev/i2cserial-missing-device")
        .output()
        .expect("probe should run");

    assert_eq!(output.status.code(), Some(69));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connecting"), "{stderr}");
    assert!(stderr.contains("i2cserial::cmd"), "{stderr}");
}

#[test]
fn probe_missing_device_returns_69() {
    let output = cli()
        .arg("probe")
        .arg("/dev/i2cserial-missing-device")
        .output()
        .expect("probe should run");

    assert_eq!(output.status.code(), Some(69));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("open failed"));
}

#[test]
fn probe_non_tty_returns_transport_error() {
    let dir = unique_temp_dir("notty");
    let path = dir.join("plain-file");
    std::fs::write(&path, b"").expect("file should be writable");

    let output = cli().arg("probe").arg(&path).output().expect("probe should run");

    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn scan_with_inverted_range_is_usage_error() {
    let output = cli()
        .args(["scan", "/dev/null", "--first", "0x50", "--last", "0x10"])
        .output()
        .expect("scan should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn set_with_wrong_value_count_is_usage_error() {
    let output = cli()
        .args(["set", "/dev/null", "0x40", "0x02", "1", "2", "--size", "byte-data"])
        .output()
        .expect("set should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn eight_bit_address_rejected_by_parser() {
    let output = cli()
        .args(["read", "/dev/null", "0xA0", "1"])
        .output()
        .expect("read should run");

    assert_eq!(output.status.code(), Some(2));
}

#[cfg(target_os = "linux")]
mod bridge {
    use std::ffi::CStr;
    use std::fs::File;
    use std::io::{Read, Write};
    use std::os::fd::FromRawFd;
    use std::thread;

    use super::*;

    const ESC: u8 = 0x1B;

    fn open_pty() -> (File, PathBuf) {
        // SAFETY: standard posix_openpt/grantpt/unlockpt/ptsname_r sequence on
        // a descriptor we own; `name` outlives the ptsname_r call.
        unsafe {
            let master = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            assert!(master >= 0, "posix_openpt failed");
            assert_eq!(libc::grantpt(master), 0);
            assert_eq!(libc::unlockpt(master), 0);
            let mut name = [0 as libc::c_char; 128];
            assert_eq!(libc::ptsname_r(master, name.as_mut_ptr(), name.len()), 0);
            let path = CStr::from_ptr(name.as_ptr()).to_string_lossy().into_owned();
            (File::from_raw_fd(master), PathBuf::from(path))
        }
    }

    /// Minimal bridge firmware on the pty master: answers version requests,
    /// reads (with bytes 0, 1, 2, ...) and writes.
    fn emulate(mut master: File) {
        let mut seen = Vec::new();
        let mut chunk = [0u8; 64];
        loop {
            let n = match master.read(&mut chunk) {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            seen.extend_from_slice(&chunk[..n]);

            let len = seen.len();
            let reply = if seen.ends_with(&[ESC, b'v']) {
                Some(vec![ESC, b'v', 0, 3, 1, 7, ESC, b'z'])
            } else if len >= 4 && seen[len - 4] == ESC && seen[len - 3] == b'r' {
                let mut reply = vec![ESC, b'r'];
                reply.extend(0..seen[len - 1]);
                reply.extend_from_slice(&[ESC, b'z']);
                Some(reply)
            } else if seen.ends_with(&[ESC, 0x04]) {
                Some(vec![ESC, b'S', ESC, b'z'])
            } else {
                None
            };

            if let Some(reply) = reply {
                seen.clear();
                if master.write_all(&reply).is_err() {
                    return;
                }
            }
        }
    }

    #[test]
    fn probe_reports_firmware_version() {
        let (master, slave) = open_pty();
        thread::spawn(move || emulate(master));

        let output = cli()
            .args(["--format", "json", "probe"])
            .arg(&slave)
            .args(["--timeout", "1s"])
            .output()
            .expect("probe should run");

        assert!(output.status.success(), "{output:?}");
        let payload: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("probe should emit json");
        assert_eq!(payload["firmware"], "0.3.1.7");
        assert_eq!(payload["transport"], "tty");
    }

    #[test]
    fn read_returns_device_bytes() {
        let (master, slave) = open_pty();
        thread::spawn(move || emulate(master));

        let output = cli()
            .args(["--format", "json", "read"])
            .arg(&slave)
            .args(["0x50", "3", "--timeout", "1s"])
            .output()
            .expect("read should run");

        assert!(output.status.success(), "{output:?}");
        let payload: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("read should emit json");
        assert_eq!(payload["data"], serde_json::json!([0, 1, 2]));
        assert_eq!(payload["hex"], "00 01 02");
    }

    #[test]
    fn write_reports_bytes_written() {
        let (master, slave) = open_pty();
        thread::spawn(move || emulate(master));

        let output = cli()
            .args(["--format", "json", "write"])
            .arg(&slave)
            .args(["0x50", "0x10", "0x1b", "--timeout", "1s"])
            .output()
            .expect("write should run");

        assert!(output.status.success(), "{output:?}");
        let payload: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("write should emit json");
        assert_eq!(payload["written"], 2);
    }

    #[test]
    fn silent_bridge_is_no_device() {
        let (_master, slave) = open_pty();

        let output = cli()
            .arg("probe")
            .arg(&slave)
            .output()
            .expect("probe should run");

        assert_eq!(output.status.code(), Some(69));
    }
}
