use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use krait_api::Api;
use krait_client::{AuthMode, Client, ClientConfiguration};
use krait_core::kinds::{ConfigMap, Deployment, Namespace, Pod};
use krait_core::resource::registry;
use krait_core::{
    DeleteOptions, DeleteResult, ListOptions, LogOptions, Patch, PatchOptions, Resource,
    WatchEvent, WatchOptions,
};
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kraitctl", version, about = "Krait CLI (M0)")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// API server base URL
    #[arg(long = "server", env = "KRAIT_SERVER", global = true)]
    server: Option<String>,

    /// Bearer token (literal)
    #[arg(long = "token", env = "KRAIT_TOKEN", global = true)]
    token: Option<String>,

    /// Bearer token file, re-read periodically
    #[arg(long = "token-file", env = "KRAIT_TOKEN_FILE", global = true)]
    token_file: Option<std::path::PathBuf>,

    /// PEM file with the server CA
    #[arg(long = "ca-cert", env = "KRAIT_CA_CERT", global = true)]
    ca_cert: Option<std::path::PathBuf>,

    /// Skip server certificate verification
    #[arg(long = "insecure", action = ArgAction::SetTrue, global = true)]
    insecure: bool,

    /// Namespace (default: "default")
    #[arg(long = "ns", global = true)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch one object by kind and name
    Get {
        /// Kind or plural, e.g. "pod" or "deployments"
        kind: String,
        name: String,
    },
    /// List objects of a kind
    Ls {
        kind: String,
        /// List across all namespaces
        #[arg(short = 'A', long = "all-namespaces", action = ArgAction::SetTrue)]
        all_namespaces: bool,
        /// Label selector, e.g. "app=web"
        #[arg(short = 'l', long = "selector")]
        selector: Option<String>,
    },
    /// Watch objects of a kind and print +/~/- events
    Watch {
        kind: String,
        #[arg(short = 'A', long = "all-namespaces", action = ArgAction::SetTrue)]
        all_namespaces: bool,
    },
    /// Fetch or follow pod logs
    Logs {
        pod: String,
        #[arg(short = 'c', long = "container")]
        container: Option<String>,
        #[arg(short = 'f', long = "follow", action = ArgAction::SetTrue)]
        follow: bool,
        #[arg(long = "tail")]
        tail: Option<i64>,
    },
    /// Delete one object by kind and name
    Delete {
        kind: String,
        name: String,
    },
    /// Scale a deployment
    Scale {
        name: String,
        #[arg(long = "replicas")]
        replicas: i32,
    },
}

fn init_tracing() {
    let env = std::env::var("KRAIT_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("KRAIT_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid KRAIT_METRICS_ADDR; expected host:port");
        }
    }
}

fn build_client(cli: &Cli) -> Result<Client> {
    let server = cli
        .server
        .clone()
        .ok_or_else(|| anyhow!("--server (or KRAIT_SERVER) is required"))?;
    let mut config = ClientConfiguration::new(server);
    if let Some(ns) = &cli.namespace {
        config = config.with_namespace(ns.clone());
    }
    if let Some(path) = &cli.ca_cert {
        config.root_ca_pem = Some(std::fs::read(path)?);
    }
    config.accept_invalid_certs = cli.insecure;
    config.auth = match (&cli.token, &cli.token_file) {
        (Some(token), _) => AuthMode::StaticToken(token.clone()),
        (None, Some(path)) => AuthMode::TokenFile(path.clone()),
        (None, None) => AuthMode::None,
    };
    Ok(Client::new(config)?)
}

/// Bind an Api for the kind: namespaced kinds follow the configured
/// namespace unless the caller asked for all of them.
fn bind<K: Resource>(client: Client, all_namespaces: bool) -> Api<K> {
    match K::descriptor().scope {
        krait_core::Scope::Cluster => Api::all(client),
        krait_core::Scope::Namespaced if all_namespaces => Api::all(client),
        krait_core::Scope::Namespaced => Api::default_namespaced(client),
    }
}

/// Run `$callback::<K>(...)` for the built-in kind named `$kind`.
macro_rules! with_kind {
    ($kind:expr, $callback:ident ( $($args:expr),* )) => {{
        let descriptor = registry::find($kind)
            .ok_or_else(|| anyhow!("unknown kind {:?} (builtin kinds only)", $kind))?;
        match descriptor.kind {
            "Pod" => $callback::<Pod>($($args),*).await,
            "Namespace" => $callback::<Namespace>($($args),*).await,
            "ConfigMap" => $callback::<ConfigMap>($($args),*).await,
            "Deployment" => $callback::<Deployment>($($args),*).await,
            other => bail!("kind {} has no CLI binding", other),
        }
    }};
}

fn display_name<K: Resource>(object: &K) -> String {
    let meta = object.metadata();
    match (&meta.namespace, &meta.name) {
        (Some(ns), Some(name)) => format!("{ns}/{name}"),
        (None, Some(name)) => name.clone(),
        _ => "<unnamed>".to_string(),
    }
}

async fn cmd_get<K: Resource>(client: Client, name: String, output: Output) -> Result<()> {
    let api = bind::<K>(client, false);
    let object = api.get(&name).await?;
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(&object)?),
        Output::Human => println!("{}", display_name(&object)),
    }
    Ok(())
}

async fn cmd_ls<K: Resource>(
    client: Client,
    all_namespaces: bool,
    selector: Option<String>,
    output: Output,
) -> Result<()> {
    let api = bind::<K>(client, all_namespaces);
    let options = ListOptions { label_selector: selector, ..ListOptions::default() };
    let list = api.list(&options).await?;
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(&list.items)?),
        Output::Human => {
            for item in &list.items {
                let age = item
                    .metadata()
                    .creation_timestamp
                    .map(|ts| format_age(chrono::Utc::now() - ts))
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<60} {}", display_name(item), age);
            }
            info!(count = list.items.len(), "listed");
        }
    }
    Ok(())
}

async fn cmd_watch<K: Resource>(client: Client, all_namespaces: bool) -> Result<()> {
    let api = bind::<K>(client, all_namespaces);
    let mut stream = api.watch(&WatchOptions::default(), None).await?;
    info!(kind = K::descriptor().kind, "watch started (ctrl-c to stop)");
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            event = stream.next() => match event {
                Some(Ok(WatchEvent::Added(o))) => println!("+ {}", display_name(&o)),
                Some(Ok(WatchEvent::Modified(o))) => println!("~ {}", display_name(&o)),
                Some(Ok(WatchEvent::Deleted(o))) => println!("- {}", display_name(&o)),
                Some(Ok(WatchEvent::Bookmark(b))) => {
                    info!(rv = %b.metadata.resource_version, "bookmark");
                }
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }
    Ok(())
}

async fn cmd_delete<K: Resource>(client: Client, name: String, output: Output) -> Result<()> {
    let api = bind::<K>(client, false);
    match api.delete(&name, &DeleteOptions::default()).await? {
        DeleteResult::Resource(object) => match output {
            Output::Json => println!("{}", serde_json::to_string_pretty(&object)?),
            Output::Human => println!("deleted {}", display_name(&object)),
        },
        DeleteResult::Status(status) => match output {
            Output::Json => println!("{}", serde_json::to_string_pretty(&status)?),
            Output::Human => {
                println!("deleted ({})", status.status.as_deref().unwrap_or("Status"))
            }
        },
    }
    Ok(())
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    if secs >= 86_400 {
        format!("{}d", secs / 86_400)
    } else if secs >= 3_600 {
        format!("{}h", secs / 3_600)
    } else if secs >= 60 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();
    let client = build_client(&cli)?;
    let output = cli.output;

    match cli.command {
        Commands::Get { ref kind, ref name } => {
            let name = name.clone();
            with_kind!(kind.as_str(), cmd_get(client, name, output))
        }
        Commands::Ls { ref kind, all_namespaces, ref selector } => {
            let selector = selector.clone();
            with_kind!(kind.as_str(), cmd_ls(client, all_namespaces, selector, output))
        }
        Commands::Watch { ref kind, all_namespaces } => {
            with_kind!(kind.as_str(), cmd_watch(client, all_namespaces))
        }
        Commands::Logs { pod, container, follow, tail } => {
            let api: Api<Pod> = Api::default_namespaced(client);
            let options = LogOptions { container, tail_lines: tail, ..LogOptions::default() };
            if follow {
                let mut lines = api.stream_logs(&pod, &options).await?;
                loop {
                    tokio::select! {
                        _ = signal::ctrl_c() => break,
                        line = lines.next() => match line {
                            Some(line) => println!("{}", line?),
                            None => break,
                        },
                    }
                }
            } else {
                print!("{}", api.logs(&pod, &options).await?);
            }
            Ok(())
        }
        Commands::Delete { ref kind, ref name } => {
            let name = name.clone();
            with_kind!(kind.as_str(), cmd_delete(client, name, output))
        }
        Commands::Scale { name, replicas } => {
            let api: Api<Deployment> = Api::default_namespaced(client);
            let patch = Patch::Merge(serde_json::json!({"spec": {"replicas": replicas}}));
            let scale = api.patch_scale(&name, &PatchOptions::default(), &patch).await?;
            let now = scale.spec.map(|s| s.replicas).unwrap_or_default();
            println!("scaled {} to {}", name, now);
            Ok(())
        }
    }
}
