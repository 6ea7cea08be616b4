//! velocitysp CLI - manage VelocityDRIVE-SP switches over serial.

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use velocitysp::cbor::YangValue;
use velocitysp::cli::{Cli, Commands, OutputFormat};
use velocitysp::config::{init_logging, Config, LoggingConfig};
use velocitysp::device::{describe_failure, Device};
use velocitysp::error::{Error, Result};
use velocitysp::sid::SidTable;
use velocitysp::transport::{list_ports, SerialTransport};

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // 0 for --help/--version, 1 for usage errors
            std::process::exit(i32::from(e.use_stderr()));
        }
    };

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), describe_failure(&e));
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let log_config = LoggingConfig {
        level: cli.log_level.clone(),
        color: !cli.no_color,
        ..Default::default()
    };
    init_logging(&log_config)?;

    let config = if let Some(ref path) = cli.config {
        Config::load(path)?
    } else if Config::default_path().exists() {
        Config::load(Config::default_path())?
    } else {
        Config::default()
    };

    match &cli.command {
        Commands::ListPorts => run_list_ports(&cli),
        Commands::Connect => run_connect(&cli, &config).await,
        Commands::Info => run_info(&cli, &config).await,
        Commands::Ping(args) => {
            let device = open_device(&cli, &config).await?;
            for _ in 0..args.count.max(1) {
                let rtt = device.ping().await?;
                println!("pong in {:.2} ms", rtt.as_secs_f64() * 1000.0);
            }
            device.disconnect();
            Ok(())
        }
        Commands::Get(args) => {
            let device = open_device(&cli, &config).await?;
            let value = device.yang_get(&args.path).await?;
            print_value(&cli, &value);
            device.disconnect();
            Ok(())
        }
        Commands::Set(args) => {
            let device = open_device(&cli, &config).await?;
            let value = parse_json_value(&args.value)?;
            device.yang_set(&args.path, value).await?;
            println!("{}", "ok".green());
            device.disconnect();
            Ok(())
        }
        Commands::Delete(args) => {
            let device = open_device(&cli, &config).await?;
            device.yang_delete(&args.path).await?;
            println!("{}", "deleted".green());
            device.disconnect();
            Ok(())
        }
        Commands::Rpc(args) => {
            let device = open_device(&cli, &config).await?;
            let params = args.params.as_deref().map(parse_json_value).transpose()?;
            match device.yang_rpc(&args.path, params).await? {
                Some(output) => print_value(&cli, &output),
                None => println!("{}", "ok".green()),
            }
            device.disconnect();
            Ok(())
        }
        Commands::Firmware(args) => run_firmware(&cli, &config, &args.file).await,
        Commands::Sid(args) => run_sid(&args.pattern),
    }
}

fn run_list_ports(cli: &Cli) -> Result<()> {
    let ports = list_ports()?;
    if cli.format == OutputFormat::Json {
        let rows: Vec<serde_json::Value> = ports
            .iter()
            .map(|p| serde_json::json!({ "name": p.name, "product": p.product }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
        return Ok(());
    }

    if ports.is_empty() {
        println!("no serial ports found");
    }
    for port in ports {
        match port.product {
            Some(product) => println!("{}  {}", port.name.bold(), product.dimmed()),
            None => println!("{}", port.name.bold()),
        }
    }
    Ok(())
}

async fn run_connect(cli: &Cli, config: &Config) -> Result<()> {
    let device = open_device(cli, config).await?;
    let info = device.identify().await?;
    println!(
        "connected: {} ({} ports{})",
        info.model.to_string().bold(),
        info.port_count,
        info.checksum
            .as_deref()
            .map(|c| format!(", yang-library {c}"))
            .unwrap_or_default()
    );
    device.disconnect();
    Ok(())
}

async fn run_info(cli: &Cli, config: &Config) -> Result<()> {
    let device = open_device(cli, config).await?;
    let info = device.identify().await?;
    let stats = device.stats();

    if cli.format == OutputFormat::Json {
        let out = serde_json::json!({
            "model": info.model,
            "port_count": info.port_count,
            "yang_library_checksum": info.checksum,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
    } else {
        println!("model:      {}", info.model.to_string().bold());
        println!("ports:      {}", info.port_count);
        if let Some(checksum) = &info.checksum {
            println!("yang-lib:   {checksum}");
        }
        println!(
            "frames:     {} sent, {} received, {} checksum errors",
            stats.frames_sent, stats.frames_received, stats.checksum_errors
        );
    }
    device.disconnect();
    Ok(())
}

async fn run_firmware(cli: &Cli, config: &Config, file: &std::path::Path) -> Result<()> {
    let image = std::fs::read(file)?;
    let device = open_device(cli, config).await?;

    let bar = ProgressBar::new(image.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<velocitysp::types::TransferProgress>();
    let reporter = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(progress) = rx.recv().await {
                bar.set_position(progress.sent);
            }
        })
    };

    let outcome = device.firmware_update(&image, Some(tx)).await;
    let _ = reporter.await;

    match outcome {
        Ok(()) => {
            bar.finish_with_message("done");
            println!("{}", "firmware transferred".green());
            device.disconnect();
            Ok(())
        }
        Err(e) => {
            bar.abandon();
            device.disconnect();
            Err(e)
        }
    }
}

fn run_sid(pattern: &str) -> Result<()> {
    let table = SidTable::embedded();
    let hits = table
        .search(pattern)
        .map_err(|e| Error::Config(format!("invalid pattern: {e}")))?;

    if hits.is_empty() {
        println!("no matches");
        return Ok(());
    }
    for entry in hits {
        println!("{:>6}  {:?}  {}", entry.sid, entry.kind, entry.path);
    }
    Ok(())
}

async fn open_device(cli: &Cli, config: &Config) -> Result<Device> {
    let port = cli
        .port
        .clone()
        .or_else(|| config.transport.port.clone())
        .ok_or_else(|| {
            Error::Config("no serial port specified; use --port or the config file".into())
        })?;

    let transport = SerialTransport::open(&port, &config.transport)?;
    Device::connect(Box::new(transport), config).await
}

fn parse_json_value(text: &str) -> Result<YangValue> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Error::Config(format!("invalid JSON value: {e}")))?;
    Ok(YangValue::from_json(&json)?)
}

fn print_value(_cli: &Cli, value: &YangValue) {
    let json = value.to_json();
    println!(
        "{}",
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
    );
}
