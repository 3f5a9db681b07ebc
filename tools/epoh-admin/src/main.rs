//! epoh-admin: operator tool for a UAV-EPOH deployment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use epoh_01_authentication::{load_secret_key, ClientAuthenticator, HandshakeConfig, Keyring};
use epoh_admin::keygen::{generate_deployment, key_path};
use epoh_admin::{format_row, FlightPlan, LeaderClient, SimulatedFlight, TailCursor, TABLE_HEADER};
use epoh_telemetry::{init_tracing, TelemetryConfig};
use shared_crypto::{scheme_for, SchemeKind};
use shared_types::ClientId;

/// UAV-EPOH operator tool
#[derive(Parser, Debug)]
#[command(name = "epoh-admin")]
#[command(about = "Key generation, simulated UAV flights and ledger dashboard for UAV-EPOH")]
struct Args {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a keyring and secret key files for a deployment
    Keygen {
        /// Identity scheme (secp256k1 or simulated)
        #[arg(long, default_value = "secp256k1")]
        scheme: SchemeKind,
        /// Leader identity
        #[arg(long, default_value = "Leader_Node_1")]
        leader: String,
        /// Client identity; repeat for several UAVs
        #[arg(long = "client", default_value = "UAV_A1")]
        clients: Vec<String>,
        /// Output directory
        #[arg(long, default_value = "keys")]
        out: PathBuf,
        /// Replace existing key material
        #[arg(long)]
        force: bool,
    },

    /// Fly the simulated patrol and stream telemetry to the Leader
    Fly {
        #[arg(long, env = "EPOH_LEADER_ADDR", default_value = "127.0.0.1:50001")]
        leader: String,
        #[arg(long, default_value = "UAV_A1")]
        client_id: String,
        /// Secret key file [default: <keyring dir>/<client-id>.key]
        #[arg(long)]
        key: Option<PathBuf>,
        #[arg(long, env = "EPOH_KEYRING", default_value = "keys/keyring.json")]
        keyring: PathBuf,
        /// Flight time in seconds
        #[arg(long, default_value_t = 60)]
        duration: u64,
        /// Seconds between samples
        #[arg(long, default_value_t = 2.0)]
        interval: f64,
    },

    /// Print the newest blocks as a ground-station table
    Tail {
        #[arg(long, env = "EPOH_LEADER_ADDR", default_value = "127.0.0.1:50001")]
        leader: String,
        #[arg(short, default_value_t = 20)]
        n: usize,
        /// Keep polling for new blocks
        #[arg(short, long)]
        follow: bool,
        /// Poll interval in seconds
        #[arg(long, default_value_t = 2.0)]
        interval: f64,
    },

    /// Show the session state of a client
    Status {
        #[arg(long, env = "EPOH_LEADER_ADDR", default_value = "127.0.0.1:50001")]
        leader: String,
        #[arg(long, default_value = "UAV_A1")]
        client_id: String,
    },

    /// Dump the Leader's Prometheus metrics
    Metrics {
        #[arg(long, env = "EPOH_LEADER_ADDR", default_value = "127.0.0.1:50001")]
        leader: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let telemetry = TelemetryConfig::from_env()
        .with_service_name("epoh-admin")
        .with_log_level(level);
    if let Err(e) = init_tracing(&telemetry) {
        eprintln!("warning: logging disabled: {e}");
    }

    match args.command {
        Command::Keygen {
            scheme,
            leader,
            clients,
            out,
            force,
        } => keygen(scheme, &leader, &clients, out, force),
        Command::Fly {
            leader,
            client_id,
            key,
            keyring,
            duration,
            interval,
        } => fly(&leader, &client_id, key, keyring, duration, interval).await,
        Command::Tail {
            leader,
            n,
            follow,
            interval,
        } => tail(&leader, n, follow, interval).await,
        Command::Status { leader, client_id } => {
            let client_id = parse_id(&client_id)?;
            let mut client = LeaderClient::connect(&leader).await?;
            let status = client.auth_status(&client_id).await?;
            println!("{client_id}: {}", serde_json::to_string(&status)?);
            Ok(())
        }
        Command::Metrics { leader } => {
            let mut client = LeaderClient::connect(&leader).await?;
            print!("{}", client.metrics().await?);
            Ok(())
        }
    }
}

fn parse_id(raw: &str) -> anyhow::Result<ClientId> {
    ClientId::parse(raw).with_context(|| format!("invalid identity {raw:?}"))
}

fn seconds(value: f64, what: &str) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {what}: {value}"))
}

fn keygen(
    scheme: SchemeKind,
    leader: &str,
    clients: &[String],
    out: PathBuf,
    force: bool,
) -> anyhow::Result<()> {
    let leader = parse_id(leader)?;
    let clients = clients
        .iter()
        .map(|c| parse_id(c))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let generated = generate_deployment(scheme, &leader, &clients, &out, force)
        .context("generating deployment keys")?;
    println!("keyring: {}", generated.keyring_path.display());
    for (id, path) in &generated.key_paths {
        println!("{id}: {}", path.display());
    }
    Ok(())
}

async fn fly(
    leader: &str,
    client_id: &str,
    key: Option<PathBuf>,
    keyring_path: PathBuf,
    duration: u64,
    interval: f64,
) -> anyhow::Result<()> {
    let client_id = parse_id(client_id)?;
    let interval = seconds(interval, "interval")?;
    if interval.is_zero() {
        bail!("interval must be positive");
    }

    let keyring = Keyring::load(&keyring_path)
        .with_context(|| format!("loading keyring {}", keyring_path.display()))?;
    if keyring.client_public(&client_id).is_none() {
        bail!("{client_id} is not registered in {}", keyring_path.display());
    }
    let key = key.unwrap_or_else(|| {
        let dir = keyring_path.parent().unwrap_or_else(|| std::path::Path::new("."));
        key_path(dir, &client_id)
    });
    let secret =
        load_secret_key(&key).with_context(|| format!("loading secret key {}", key.display()))?;

    let authenticator = ClientAuthenticator::new(
        scheme_for(keyring.scheme()),
        client_id.clone(),
        secret,
        keyring.leader_public().clone(),
        HandshakeConfig::default(),
    );

    let mut client = LeaderClient::connect(leader).await?;
    let mut session = client.authenticate(&authenticator).await?;

    let plan = FlightPlan::square_patrol(Duration::from_secs(duration), interval);
    let samples = plan.sample_count();
    let mut flight = SimulatedFlight::new(plan);
    let mut ticker = tokio::time::interval(interval);

    for n in 0..=samples {
        ticker.tick().await;
        let sample = if n < samples {
            flight.step(interval.as_secs_f64())
        } else {
            flight.land()
        };
        let payload = sample.to_payload()?;

        let (index, hash) = match client.submit(&session, payload.clone()).await {
            Ok(ack) => ack,
            Err(e) if e.leader_kind() == Some("no_active_session") => {
                tracing::warn!(client_id = %client_id, "session lapsed, re-authenticating");
                session = client.authenticate(&authenticator).await?;
                client.submit(&session, payload).await?
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            index,
            hash = %hex::encode(&hash[..5]),
            x = sample.x_pos,
            y = sample.y_pos,
            z = sample.z_alt,
            "telemetry committed"
        );
    }

    client.logout(&session).await?;
    tracing::info!(client_id = %client_id, "flight complete, logged out");
    Ok(())
}

async fn tail(leader: &str, n: usize, follow: bool, interval: f64) -> anyhow::Result<()> {
    let interval = seconds(interval, "interval")?;
    let mut client = LeaderClient::connect(leader).await?;
    let mut cursor = TailCursor::default();

    println!("{TABLE_HEADER}");
    loop {
        let blocks = client.tail(n).await?;
        for block in cursor.fresh(&blocks) {
            println!("{}", format_row(block));
        }
        if !follow {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
