use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mbus_telegram::constants::MBUS_MAX_PRIMARY_SLAVES;
use mbus_telegram::logging::{log_debug, log_warn};
use mbus_telegram::mbus::{parse_mask, AddressMask};
use mbus_telegram::payload::MBusPacket;
use mbus_telegram::util::hex::{decode_hex, pretty_hex};
use mbus_telegram::{
    init_logger, log_info, map_to_packet, normalize_record, parse_frame, MBusMaster, MasterConfig,
    SerialConfig, SerialTransport, TcpTransport, Transport, UdpTransport,
};
use serde_json::json;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mbus-cli")]
#[command(about = "CLI tool for wired M-Bus telegrams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
#[group(required = true, multiple = false)]
struct Link {
    /// Serial port, e.g. /dev/ttyUSB0
    #[arg(long)]
    port: Option<String>,
    /// TCP gateway as host:port
    #[arg(long)]
    tcp: Option<String>,
    /// UDP gateway as host:port
    #[arg(long)]
    udp: Option<String>,
}

#[derive(Args, Clone)]
struct LinkOptions {
    #[command(flatten)]
    link: Link,
    #[arg(short, long, default_value = "2400")]
    baudrate: u32,
    /// Response timeout in milliseconds (default follows the baud rate)
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long, default_value = "3")]
    retries: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a hex telegram and print it as JSON
    Decode { hex: String },
    /// Send SND_NKE and report whether the device answered
    Ping {
        address: u8,
        #[command(flatten)]
        options: LinkOptions,
    },
    /// Read all telegrams of a device
    Request {
        address: u8,
        #[command(flatten)]
        options: LinkOptions,
    },
    /// Ping primary addresses
    Scan {
        #[arg(long, default_value = "0")]
        from: u8,
        #[arg(long, default_value_t = MBUS_MAX_PRIMARY_SLAVES)]
        to: u8,
        #[command(flatten)]
        options: LinkOptions,
    },
    /// Wildcard search for secondary addresses
    ScanSecondary {
        /// Start mask, 16 hex digits
        #[arg(long)]
        mask: Option<String>,
        #[command(flatten)]
        options: LinkOptions,
    },
}

fn packet_json(packet: &MBusPacket) -> serde_json::Value {
    let normalized: Vec<_> = match packet {
        MBusPacket::VariableData(data) => data.records.iter().map(normalize_record).collect(),
        _ => Vec::new(),
    };
    json!({ "packet": packet, "normalized": normalized })
}

fn print_packets(packets: &[MBusPacket]) -> Result<()> {
    let values: Vec<_> = packets.iter().map(packet_json).collect();
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

async fn open(options: &LinkOptions) -> Result<MBusMaster<Box<dyn Transport>>> {
    let serial = SerialConfig::new(options.baudrate);
    let config = MasterConfig {
        response_timeout: options
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(serial.timeout),
        retries: options.retries,
        ..MasterConfig::default()
    };

    let transport: Box<dyn Transport> = match &options.link {
        Link { port: Some(port), .. } => Box::new(SerialTransport::new(port.clone(), serial)),
        Link { tcp: Some(addr), .. } => Box::new(TcpTransport::new(addr.clone())),
        Link { udp: Some(addr), .. } => Box::new(UdpTransport::new(addr.clone())),
        _ => bail!("one of --port, --tcp or --udp is required"),
    };

    let mut master = MBusMaster::new(transport, config);
    master.connect().await.context("failed to open link")?;
    Ok(master)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { hex } => {
            let bytes = decode_hex(&hex)?;
            log_debug(&format!("Decoding {} bytes:\n{}", bytes.len(), pretty_hex(&bytes, 16)));
            let frame = parse_frame(&bytes)?;
            let packet = map_to_packet(&frame)?;
            let output = json!({ "frame": frame, "decoded": packet_json(&packet) });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Ping { address, options } => {
            let mut master = open(&options).await?;
            let present = master.ping(address).await?;
            println!("{address}: {}", if present { "present" } else { "no reply" });
            master.disconnect().await?;
        }
        Commands::Request { address, options } => {
            let mut master = open(&options).await?;
            let packets = master.request_all(address).await?;
            print_packets(&packets)?;
            master.disconnect().await?;
        }
        Commands::Scan { from, to, options } => {
            if from > to {
                bail!("--from {from} is above --to {to}");
            }
            let mut master = open(&options).await?;
            let addresses = master.scan_primary(from..=to).await?;
            for address in &addresses {
                println!("{address}");
            }
            if addresses.is_empty() {
                log_warn("No device answered");
            } else {
                log_info(&format!("{} device(s) found", addresses.len()));
            }
            master.disconnect().await?;
        }
        Commands::ScanSecondary { mask, options } => {
            let start = match mask {
                Some(text) => parse_mask(&text)?,
                None => AddressMask::wildcard(),
            };
            let mut master = open(&options).await?;
            let found = master.scan_secondary_from(start).await?;
            for address in &found {
                println!("{address} ({})", address.manufacturer_code());
            }
            log_info(&format!("{} device(s) found", found.len()));
            master.disconnect().await?;
        }
    }

    Ok(())
}
