//! tagscan service binary.
//!
//! Thin shell around the library crates: parse options, initialize logging,
//! pick a transport, then hand off to the scan loop. Rounds are published
//! as JSON lines on stdout.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tagscan_core::{
    DeviceHint,
    constants::{DEFAULT_BAUD_RATE, DEFAULT_WINDOW_MS, ROUND_DELAY_MS},
};
use tagscan_inventory::{Blacklist, JsonLineSink, ScanConfig, ScanLoop};
use tagscan_link::{LinkManager, LinkTransport, MockTransport};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Continuous UHF RFID inventory scanner")]
struct Options {
    /// Serial port path; omit to auto-discover.
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Collection window per inventory round, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_WINDOW_MS)]
    window_ms: u64,

    /// Delay between rounds, in milliseconds.
    #[arg(long, default_value_t = ROUND_DELAY_MS)]
    round_delay_ms: u64,

    /// Additional EPCs to exclude from published rounds.
    #[arg(long = "blacklist", value_name = "EPC")]
    blacklist: Vec<String>,

    /// Run against a built-in simulated reader instead of real hardware.
    #[arg(long)]
    simulate: bool,
}

impl Options {
    fn scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig::new();
        config.inventory.window = Duration::from_millis(self.window_ms);
        config.round_delay = Duration::from_millis(self.round_delay_ms);
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let options = Options::parse();
    let blacklist = Blacklist::with_entries(&options.blacklist)?;

    if options.simulate {
        run_simulated(options, blacklist).await
    } else {
        run_hardware(options, blacklist).await
    }
}

#[cfg(feature = "serial")]
async fn run_hardware(options: Options, blacklist: Blacklist) -> anyhow::Result<()> {
    let transport = tagscan_link::SerialTransport::with_baud_rate(options.baud);
    let hint = DeviceHint::from_option(options.port.clone());
    run_scan(transport, hint, blacklist, options.scan_config()).await
}

#[cfg(not(feature = "serial"))]
async fn run_hardware(_options: Options, _blacklist: Blacklist) -> anyhow::Result<()> {
    anyhow::bail!("built without serial support; rebuild with --features serial or use --simulate")
}

/// Run against the mock transport, with a feeder task standing in for tags
/// passing the antenna.
async fn run_simulated(options: Options, blacklist: Blacklist) -> anyhow::Result<()> {
    use bytes::Bytes;
    use tagscan_protocol::tag_report_frame;

    let transport = MockTransport::new().with_port(
        tagscan_core::PortInfo::new("sim0").with_product("Simulated UHF reader"),
    );

    let feeder_transport = transport.clone();
    tokio::spawn(async move {
        let tags: [&[u8]; 3] = [
            &[0xE2, 0x00, 0x68, 0x16, 0x00, 0x00, 0x00, 0x60, 0x12, 0x34, 0x56, 0x78],
            &[0xE2, 0x00, 0x68, 0x16, 0x00, 0x00, 0x00, 0x60, 0x12, 0x34, 0x56, 0x79],
            &[0xE2, 0x80, 0x11, 0x70, 0x00, 0x00, 0x02, 0x0F, 0x5C, 0x6B, 0x10, 0x01],
        ];
        let mut tick: usize = 0;
        loop {
            tokio::time::sleep(Duration::from_millis(150)).await;
            if let Some(port) = feeder_transport.last_port() {
                // A varying subset of tags answers each poll.
                for &epc in tags.iter().take(1 + tick % tags.len()) {
                    port.push_chunk(Bytes::from(tag_report_frame(0xC8, &[0x30, 0x00], epc, &[0xAB, 0xCD])));
                }
            }
            tick += 1;
        }
    });

    run_scan(transport, DeviceHint::Auto, blacklist, options.scan_config()).await
}

async fn run_scan<T: LinkTransport>(
    transport: T,
    hint: DeviceHint,
    blacklist: Blacklist,
    config: ScanConfig,
) -> anyhow::Result<()> {
    let link = Arc::new(LinkManager::new(transport));

    // Discovery failure before the first open is the one fatal startup path.
    let address = link.discover(&hint).await?;
    link.connect(address).await?;

    let sink = JsonLineSink::stdout();
    let mut scan = ScanLoop::new(link, sink, blacklist, config);

    tokio::select! {
        _ = scan.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }
    Ok(())
}
