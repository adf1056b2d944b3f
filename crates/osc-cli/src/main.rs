//! OSC CLI - send and receive Open Sound Control packets from the command line

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use osc_core::{Argument, Bundle, Message, Packet, TimeTag, DEFAULT_PORT};
use osc_transport::{OscClient, OscServer, TcpClient, TcpServer, UdpClient, UdpServer};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// OSC - Open Sound Control 1.0 toolkit
#[derive(Parser)]
#[command(name = "osc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info", env = "OSC_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Protocol {
    Udp,
    Tcp,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for OSC packets and print every matching message
    Listen {
        /// Transport protocol
        #[arg(short, long, value_enum, default_value = "udp")]
        protocol: Protocol,

        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,

        /// Port number
        #[arg(short = 'P', long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Address pattern to print (e.g. "/synth/*/freq")
        #[arg(default_value = "/*")]
        pattern: String,

        /// Print messages as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Send a single message
    Send {
        /// Target host
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Target port
        #[arg(short = 'P', long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Transport protocol
        #[arg(short, long, value_enum, default_value = "udp")]
        protocol: Protocol,

        /// Wrap the message in a bundle with an immediate time tag
        #[arg(long)]
        bundle: bool,

        /// OSC address (e.g. "/synth/1/freq")
        address: String,

        /// Arguments as tag:value, e.g. i:1 f:440.0 s:sine T N
        args: Vec<Argument>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli.log_level, cli.json_logs)?;

    match cli.command {
        Commands::Listen {
            protocol,
            bind,
            port,
            pattern,
            json,
        } => {
            let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received shutdown signal");
                    let _ = shutdown_tx.send(()).await;
                }
            });

            let addr = format!("{}:{}", bind, port);
            println!(
                "{} Listening for {} on {} ({:?})",
                "OSC".cyan().bold(),
                pattern.yellow(),
                addr,
                protocol
            );
            listen(protocol, &addr, &pattern, json, &mut shutdown_rx).await?;
        }
        Commands::Send {
            host,
            port,
            protocol,
            bundle,
            address,
            args,
        } => {
            let message = Message {
                address,
                arguments: args,
            };
            println!("{} Sending {}", "OSC".cyan().bold(), message);

            let packet = if bundle {
                Packet::Bundle(Bundle::with_time_tag(TimeTag::immediate()).with_packet(message))
            } else {
                Packet::Message(message)
            };
            send(protocol, &host, port, &packet).await?;
            println!("{} Sent to {}:{}", "OK".green().bold(), host, port);
        }
    }

    Ok(())
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to parse log level")?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }

    Ok(())
}

fn print_message(message: &Message, json: bool) {
    if json {
        match serde_json::to_string(message) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("{} {}", "JSON".red(), e),
        }
    } else {
        let args: Vec<String> = message.arguments.iter().map(|a| a.to_string()).collect();
        println!(
            "{} {} {}",
            message.address.yellow(),
            message.type_tag_string().dimmed(),
            args.join(" ")
        );
    }
}

async fn listen(
    protocol: Protocol,
    addr: &str,
    pattern: &str,
    json: bool,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let server: Box<dyn OscServer> = match protocol {
        Protocol::Udp => Box::new(UdpServer::bind(addr).await?),
        Protocol::Tcp => Box::new(TcpServer::bind(addr).await?),
    };

    server
        .address_space()
        .handle(pattern, move |msg| print_message(msg, json))
        .with_context(|| format!("Invalid address pattern {}", pattern))?;

    println!(
        "{} Ready on {}",
        "OK".green().bold(),
        server.local_addr()?
    );

    tokio::select! {
        result = server.serve() => {
            result?;
        }
        _ = shutdown_rx.recv() => {
            println!("{}", "Stopped".yellow());
        }
    }

    Ok(())
}

async fn send(protocol: Protocol, host: &str, port: u16, packet: &Packet) -> Result<()> {
    let remote = resolve(host, port).await?;

    let mut client: Box<dyn OscClient> = match protocol {
        Protocol::Udp => Box::new(UdpClient::new(remote)),
        Protocol::Tcp => Box::new(TcpClient::new(remote)),
    };

    client.connect().await?;
    client.send(packet).await?;
    client.disconnect().await?;
    Ok(())
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("Failed to resolve {}", host))?
        .next()
        .ok_or_else(|| anyhow!("No address found for {}", host))
}
