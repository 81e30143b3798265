//! Run one command on a VRP device and print the classified result.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example run_command -- --host 192.168.77.140 --user admin --password secret \
//!     --command "display version"
//!
//! # Apply a change and save it
//! cargo run --example run_command -- --host 192.168.77.140 --user admin --password secret \
//!     --command "system-view
//! vlan 800" --save
//! ```

use std::env;
use std::time::Duration;

use hwshell::DeviceClientBuilder;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let Some(password) = args.password else {
        eprintln!("Error: Must provide --password");
        std::process::exit(1);
    };

    let client = DeviceClientBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .password(password)
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    println!("Executing on {}:{}: {}", args.host, args.port, args.command);
    println!("{}", "-".repeat(50));

    let execution = client
        .execute(&args.command, args.save, &CancellationToken::new())
        .await?;

    println!("{}", execution.response);
    println!("{}", "-".repeat(50));
    println!(
        "rc={} changed={} pages={} elapsed={:?}",
        execution.response.rc(),
        execution.changed,
        execution.response.pages,
        execution.response.elapsed
    );

    if let Some(saved) = &execution.saved {
        println!("save rc={}", saved.rc);
    }
    if let Some(failure) = execution.failure() {
        eprintln!("Failed: {failure}");
        std::process::exit(1);
    }

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    command: String,
    save: bool,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 22u16;
        let mut user = env::var("USER").unwrap_or_else(|_| "admin".to_string());
        let mut password = None;
        let mut command = "display version".to_string();
        let mut save = false;
        let mut timeout = 30u64;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(22);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--command" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        command = args[i].clone();
                    }
                }
                "--save" | "-s" => save = true,
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(30);
                    }
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            host,
            port,
            user,
            password,
            command,
            save,
            timeout,
        }
    }

    fn print_help() {
        println!(
            r#"hwshell run_command example

USAGE:
    cargo run --example run_command -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>        Target host [default: localhost]
    -p, --port <PORT>        SSH port [default: 22]
    -u, --user <USER>        Username [default: $USER]
    -P, --password <PASS>    Password for authentication
    -c, --command <CMD>      Command block [default: display version]
    -s, --save               Save the configuration afterwards
    -t, --timeout <SECS>     Connection timeout [default: 30]
    --help                   Print this help message
"#
        );
    }
}
