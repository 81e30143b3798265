//! Task runner: read a JSON task request, run it, print the JSON result.
//!
//! # Usage
//!
//! ```bash
//! hwshell args.json          # request from a file
//! hwshell < args.json        # request from stdin
//! RUST_LOG=debug hwshell args.json
//! ```
//!
//! The request has the fields `command`, `shost`, `sport` (default 22),
//! `suser`, `spass` and `save` (default false). The process exits with
//! status 1 when the result reports a failure.

use std::io::Read;
use std::process::ExitCode;

use hwshell::task::{TaskRequest, TaskResult, run_task};
use hwshell::Timings;
use log::warn;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only the result document.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let source = std::env::args().nth(1);
    if source.as_deref() == Some("--help") {
        print_help();
        return ExitCode::SUCCESS;
    }

    let result = match read_request(source.as_deref()) {
        Ok(request) => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupted, cancelling task");
                    on_interrupt.cancel();
                }
            });
            run_task(&request, Timings::default(), &cancel).await
        }
        Err(msg) => TaskResult {
            failed: true,
            rc: 1,
            msg: Some(msg),
            ..TaskResult::default()
        },
    };

    match serde_json::to_string(&result) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to encode result: {e}");
            return ExitCode::FAILURE;
        }
    }

    if result.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Read the request from `source`, or from stdin when it is absent or `-`.
fn read_request(source: Option<&str>) -> Result<TaskRequest, String> {
    let text = match source {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("failed to read request from stdin: {e}"))?;
            text
        }
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read request file {path}: {e}"))?,
    };

    serde_json::from_str(&text).map_err(|e| format!("invalid task request: {e}"))
}

fn print_help() {
    println!(
        r#"hwshell: run one command on a Huawei VRP device

USAGE:
    hwshell [REQUEST.json | -]

REQUEST:
    {{"command": "display version", "shost": "192.168.77.140",
     "sport": 22, "suser": "user1", "spass": "secret", "save": false}}

Set RUST_LOG=debug for verbose logging on stderr.
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_read_request_from_file() {
        let path = std::env::temp_dir().join(format!("hwshell-request-{}.json", std::process::id()));
        assert_ok!(std::fs::write(
            &path,
            r#"{"command": "display version", "shost": "10.0.0.1", "suser": "user1", "spass": "x"}"#,
        ));

        let request = assert_ok!(read_request(path.to_str()));
        let _ = std::fs::remove_file(&path);

        assert_eq!(request.command, "display version");
        assert_eq!(request.sport, 22);
    }

    #[test]
    fn test_read_request_reports_errors() {
        let msg = assert_err!(read_request(Some("/nonexistent/hwshell/--help")));
        assert!(msg.starts_with("failed to read request file"));
    }
}
