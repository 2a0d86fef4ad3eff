use crate::config::{CharacterOptions, UrsulaConfiguration, UrsulaOptions, UrsulaOverrides};
use crate::keyring::{PassphraseSource, TlsCurve};
use crate::network::{run_status_server, StatusState};
use clap::Parser;
use eyre::Result;
use futures::pin_mut;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::future::Future;
use tracing::*;
use tracing_subscriber::{prelude::*, EnvFilter};

#[inline]
pub fn run() -> Result<()> {
    App::parse().run()
}

#[derive(Parser)]
#[command(author, about = "UMBRA", long_about = None)]
pub struct App {
    #[arg(long = "rest-host")]
    pub rest_host: Option<String>,

    #[arg(long = "rest-port")]
    pub rest_port: Option<u16>,

    #[arg(long = "config-root")]
    pub config_root: Option<PathBuf>,

    #[arg(long = "db-filepath")]
    pub db_filepath: Option<PathBuf>,

    #[arg(long)]
    pub account: Option<String>,

    #[arg(long = "worker-address")]
    pub worker_address: Option<String>,

    #[arg(long = "tls-curve")]
    pub tls_curve: Option<TlsCurve>,

    /// Run an ephemeral development node
    #[arg(long)]
    pub dev: bool,

    /// Operate without any ledger capability
    #[arg(long = "federated")]
    pub federated_only: bool,

    /// Ledger endpoint speaks proof-of-authority
    #[arg(long)]
    pub poa: bool,

    #[clap(long = "provider-uri", env = "UMBRA_PROVIDER_URI")]
    pub provider_uri: Option<String>,

    #[clap(long = "registry-filepath", env = "UMBRA_REGISTRY_FILEPATH")]
    pub registry_filepath: Option<PathBuf>,

    /// Environment variable holding the keyring passphrase
    #[arg(long = "passphrase-env", default_value = PassphraseSource::DEFAULT_ENV_VAR)]
    pub passphrase_env: String,

    /// Write keyring material and runtime directories before producing
    #[arg(long)]
    pub init: bool,

    #[arg(
        long = "full-log-context",
        env = "FULL_LOG_CONTEXT",
        default_value_t = false
    )]
    pub full_log_context: bool,

    #[clap(long, help = "Port for the metrics server")]
    pub metrics_port: Option<u16>,
}

impl App {
    pub fn run(self) -> Result<()> {
        self.init_tracing();
        let tokio_runtime = tokio_runtime()?;
        tokio_runtime.block_on(run_until_ctrl_c(self.execute()))?;
        Ok(())
    }

    fn init_tracing(&self) {
        let rust_log_level = Level::from_str(
            std::env::var("RUST_LOG")
                .unwrap_or("info".to_string())
                .as_str(),
        )
        .unwrap();

        let filter = if self.full_log_context {
            EnvFilter::builder().parse_lossy(rust_log_level.as_str())
        } else {
            let filter_tag = format!("app={rust_log_level},agents={rust_log_level}");
            EnvFilter::builder().parse_lossy(filter_tag.as_str())
        };

        let main_layer = tracing_subscriber::fmt::layer().with_target(true);

        let layers = if rust_log_level == Level::DEBUG || rust_log_level == Level::TRACE {
            vec![main_layer
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter)
                .boxed()]
        } else {
            vec![main_layer.with_filter(filter).boxed()]
        };

        tracing_subscriber::registry().with(layers).init();
    }

    async fn execute(self) -> Result<()> {
        let options = UrsulaOptions {
            character: CharacterOptions {
                account: self.account,
                config_root: self.config_root,
                rest_host: self.rest_host,
                rest_port: self.rest_port,
                tls_curve: self.tls_curve,
                certificate: None,
                provider_uri: self.provider_uri,
                registry_filepath: self.registry_filepath,
                passphrase_source: Some(PassphraseSource::EnvVar(self.passphrase_env)),
                federated_only: self.federated_only,
                poa: self.poa,
                temp: self.dev,
            },
            db_filepath: self.db_filepath,
            worker_address: self.worker_address,
        };
        let mut configuration = UrsulaConfiguration::assemble(options)?;

        if self.init {
            let passphrase = configuration.base.passphrase_source.resolve()?;
            configuration.base.write_defaults(&passphrase)?;
        }

        let ursula = configuration.produce(UrsulaOverrides::default())?;
        let (rest_host, rest_port) = ursula.rest_interface();
        info!("Ursula {} serving at {rest_host}:{rest_port}", ursula.account());
        info!("Datastore at {}", ursula.db_filepath().display());

        crate::metrics::start_server(self.metrics_port).await;

        let state = Arc::new(StatusState {
            metadata: ursula.metadata(),
            known_nodes: ursula.known_nodes(),
            federated_only: ursula.is_federated(),
        });
        run_status_server(state, rest_port).await;

        Ok(())
    }
}

pub fn tokio_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

async fn run_until_ctrl_c<F, E>(fut: F) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: Send + Sync + 'static + From<std::io::Error>,
{
    let ctrl_c = tokio::signal::ctrl_c();

    let mut stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let sigterm = stream.recv();
    pin_mut!(sigterm, ctrl_c, fut);

    tokio::select! {
        _ = ctrl_c => {
            info!("Received ctrl-c");
        },
        _ = sigterm => {
            info!("Received SIGTERM");
        },
        res = fut => res?,
    }

    Ok(())
}
