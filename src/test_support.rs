//! Fixtures shared by the unit tests.
//!
//! `fake_engine()` installs a shell script honouring the subset of the tshark
//! command line this crate emits:
//! - `--version` succeeds;
//! - capture (`-w`): writes a small file and sleeps for `-a duration:N`,
//!   exiting 0 on SIGTERM. Interface `fail0` fails immediately, `silent0`
//!   writes no file and `stubborn0` ignores SIGTERM;
//! - analysis (`-r`): prints one packet in the `-T` format, nothing for the
//!   display filter `frame.number == 0`, and fails for `invalid ((`.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

const FAKE_ENGINE: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "TShark (Wireshark) 4.2.0 (fake)"
  exit 0
fi

write_file=""
read_file=""
interface=""
duration=1
mode=text
display_filter=""
fields=""
option=""
while [ $# -gt 0 ]; do
  case "$1" in
    -w) write_file="$2"; shift ;;
    -r) read_file="$2"; shift ;;
    -i) interface="$2"; shift ;;
    -a) duration="${2#duration:}"; shift ;;
    -c) shift ;;
    -f) shift ;;
    -T) mode="$2"; shift ;;
    -Y) display_filter="$2"; shift ;;
    -e) fields="$fields $2"; shift ;;
    -o) option="$2"; shift ;;
  esac
  shift
done

if [ -n "$write_file" ]; then
  if [ "$interface" = "fail0" ]; then
    echo "tshark: The capture session could not be initiated on interface 'fail0'." >&2
    exit 2
  fi
  if [ "$interface" = "stubborn0" ]; then
    trap '' TERM
  else
    trap 'kill "$sleeper" 2>/dev/null; exit 0' TERM
  fi
  if [ "$interface" != "silent0" ]; then
    printf 'fake-pcapng' > "$write_file"
  fi
  echo "Capturing on '$interface'" >&2
  sleep "$duration" &
  sleeper=$!
  wait "$sleeper"
  exit 0
fi

if [ -n "$read_file" ]; then
  if [ ! -r "$read_file" ]; then
    echo "tshark: The file \"$read_file\" doesn't exist." >&2
    exit 2
  fi
  if [ "$display_filter" = "invalid ((" ]; then
    echo "tshark: \"((\" was unexpected in this context." >&2
    exit 4
  fi
  if [ "$display_filter" = "frame.number == 0" ]; then
    exit 0
  fi
  if [ -n "$option" ]; then
    echo "option:$option"
  fi
  case "$mode" in
    json) printf '[{"_source":{"layers":{"frame.number":["1"]}}}]\n' ;;
    fields)
      echo "fields:$fields"
      printf '1\t0.000000000\t10.0.0.1\t10.0.0.2\t51000\t443\n'
      ;;
    *) echo "    1   0.000000000     10.0.0.1 -> 10.0.0.2     TCP 74 51000 -> 443 [SYN]" ;;
  esac
  exit 0
fi

exit 1
"#;

static ENGINE: OnceLock<PathBuf> = OnceLock::new();

/// Path to the fake engine, installed once per test process.
pub fn fake_engine() -> PathBuf {
    ENGINE.get_or_init(install).clone()
}

fn install() -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let dir = std::env::temp_dir().join(format!("wiretap-fake-engine-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create fake engine dir");
    let path = dir.join("tshark");
    std::fs::write(&path, FAKE_ENGINE).expect("write fake engine");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake engine");

    // Another test thread forking while the script was open for writing can
    // make exec fail with ETXTBSY for a short while.
    for _ in 0..100 {
        let ready = std::process::Command::new(&path)
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if ready {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    path
}

/// Builds a capture file at `path` the fake engine can "read".
pub fn write_capture_file(path: &std::path::Path) {
    std::fs::write(path, b"fake-pcapng").expect("write capture file");
}
