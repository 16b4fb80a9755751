//! Media check: report nodes low on harddisk space and the platform table.
//!
//! # Usage
//!
//! Direct:
//! ```bash
//! cargo run --example media_check -- --host 10.20.0.1 --user admin --password secret
//! ```
//!
//! Through a bastion:
//! ```bash
//! cargo run --example media_check -- --host 10.20.0.1 --user admin --password secret \
//!     --bastion jump.example.net --bastion-user ops --bastion-password hunter2
//! ```

use std::env;

use xrscrape::{SessionBuilder, SessionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let Some(password) = args.password else {
        eprintln!("Error: --password is required");
        std::process::exit(1);
    };

    let config = SessionConfig {
        media_threshold_gb: args.threshold,
        ..SessionConfig::default()
    };

    let mut builder = SessionBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .password(password.as_str().into())
        .config(config);
    if let Some(bastion) = &args.bastion {
        let bastion_password = args.bastion_password.as_deref().unwrap_or_default();
        builder = builder.bastion(bastion, &args.bastion_user, bastion_password.into());
    }

    println!("Connecting to {}:{}...", args.host, args.port);
    let mut router = builder.open().await?;
    if let Some(port) = router.relay_port() {
        println!("Relayed through 127.0.0.1:{port}");
    }

    let low = router.show_media_default().await?;
    if low.is_empty() {
        println!("All harddisks above {} GB", args.threshold);
    } else {
        for node in &low {
            println!("{node}: harddisk below {} GB", args.threshold);
        }
    }

    println!("\n{:<18}{:<27}{:<18}{}", "Node", "Type", "State", "Config state");
    println!("{}", "-".repeat(80));
    for entry in router.show_platform().await? {
        println!(
            "{:<18}{:<27}{:<18}{}",
            entry.node, entry.kind, entry.state, entry.config_state
        );
    }

    router.close().await?;
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    bastion: Option<String>,
    bastion_user: String,
    bastion_password: Option<String>,
    threshold: f64,
}

impl Args {
    fn parse() -> Self {
        let user = env::var("USER").unwrap_or_else(|_| "admin".to_string());
        let mut parsed = Self {
            host: "127.0.0.1".to_string(),
            port: 22,
            bastion_user: user.clone(),
            user,
            password: None,
            bastion: None,
            bastion_password: None,
            threshold: 2.0,
        };

        let mut args = env::args().skip(1);
        while let Some(flag) = args.next() {
            let mut value = || args.next().unwrap_or_default();
            match flag.as_str() {
                "--host" | "-h" => parsed.host = value(),
                "--port" | "-p" => parsed.port = value().parse().unwrap_or(22),
                "--user" | "-u" => parsed.user = value(),
                "--password" | "-P" => parsed.password = Some(value()),
                "--bastion" => parsed.bastion = Some(value()),
                "--bastion-user" => parsed.bastion_user = value(),
                "--bastion-password" => parsed.bastion_password = Some(value()),
                "--threshold" => parsed.threshold = value().parse().unwrap_or(2.0),
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => eprintln!("Unknown argument: {other}"),
            }
        }
        parsed
    }

    fn print_help() {
        println!(
            r#"xrscrape media_check example

USAGE:
    cargo run --example media_check -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>              Router address [default: 127.0.0.1]
    -p, --port <PORT>              Router SSH port [default: 22]
    -u, --user <USER>              Router username [default: $USER]
    -P, --password <PASS>          Router password
    --bastion <HOST>               Bastion to relay through
    --bastion-user <USER>          Bastion username [default: $USER]
    --bastion-password <PASS>      Bastion password
    --threshold <GB>               Flag harddisks below this [default: 2.0]
    --help                         Print this help message
"#
        );
    }
}
