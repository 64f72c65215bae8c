//! orgchart CLI: org charts from LDAP / Active Directory
//!
//! The hierarchy follows each person's `manager` attribute and people are
//! clustered by department. Attributes read, by schema:
//!
//! | inetOrgPerson      | Active Directory |
//! |--------------------|------------------|
//! | displayName        | displayName      |
//! | title              | title            |
//! | o                  | company          |
//! | departmentNumber   | department       |

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use dialoguer::Password;
use orgchart::config::{ChartConfig, ConnectionConfig};
use orgchart::directory::{
    list_members, load_snapshot, save_snapshot_file, DirectorySource, LdapDirectory, Member,
    RawEntry, Schema,
};
use orgchart::pipeline::{fetch_entries, generate_chart};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Level};

#[derive(Parser)]
#[command(
    name = "orgchart",
    version,
    about = "Generate an org chart in Graphviz DOT format from an LDAP directory"
)]
struct Cli {
    /// YAML configuration file; command-line flags take precedence
    #[arg(long, global = true, env = "ORGCHART_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Print extra information to stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Print debug information to stderr
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    /// Trace everything when above 0 (range 0 to 9)
    #[arg(
        long = "trace-level",
        default_value_t = 0,
        global = true,
        value_parser = clap::value_parser!(u8).range(0..=9)
    )]
    trace_level: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// LDAP bind DN (e.g. alice@example.com)
    #[arg(short = 'D', long = "binddn", global = true)]
    bind_dn: Option<String>,

    /// LDAP simple bind password
    #[arg(short = 'w', long, global = true)]
    password: Option<String>,

    /// Prompt for the bind password
    #[arg(short = 'W', long, global = true)]
    askpass: bool,

    /// File whose first line is the bind password
    #[arg(short = 'p', long = "passfile", global = true)]
    password_file: Option<PathBuf>,

    /// Use STARTTLS
    #[arg(short = 'S', long, global = true)]
    starttls: bool,

    /// CA certificate (PEM) used to verify the server
    #[arg(short = 'C', long = "cafile", global = true)]
    ca_file: Option<PathBuf>,

    /// Connect timeout in seconds (-1: forever)
    #[arg(short = 't', long, global = true, allow_negative_numbers = true)]
    timeout: Option<i64>,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Plain,
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the directory and write the org chart
    Chart {
        /// LDAP URI (e.g. ldaps://ad.example.com)
        ldap_uri: Option<String>,

        /// LDAP base DN (e.g. dc=example,dc=com)
        base_dn: Option<String>,

        /// Output file (stdout if omitted or "-")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory schema: inetOrgPerson or ActiveDirectory (case-insensitive)
        #[arg(long)]
        schema: Option<Schema>,

        /// Also save the raw search results as a JSON snapshot
        #[arg(long)]
        save_snapshot: Option<PathBuf>,
    },
    /// Render an org chart from a saved snapshot
    Render {
        /// Snapshot written by `chart --save-snapshot`
        snapshot: PathBuf,

        /// Output file (stdout if omitted or "-")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the members of a mailing list, expanding dynamic distribution lists
    Members {
        /// DN of the mailing list (e.g. CN=Example List,CN=Users,DC=example,DC=com)
        list_dn: String,

        /// LDAP URI (e.g. ldaps://ad.example.com)
        #[arg(short = 'H', long = "ldap-uri")]
        ldap_uri: Option<String>,

        #[arg(long, default_value = "plain")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Most verbose flag wins; `warn` when none is given
fn log_level(cli: &Cli) -> Level {
    if cli.trace_level > 0 {
        Level::TRACE
    } else if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

fn init_tracing(cli: &Cli) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(cli))
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => ChartConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ChartConfig::default(),
    };
    cli.connection.apply(&mut config.connection);

    match cli.command {
        Commands::Chart {
            ldap_uri,
            base_dn,
            output,
            schema,
            save_snapshot,
        } => {
            if let Some(uri) = ldap_uri {
                config.connection.uri = uri;
            }
            if let Some(base_dn) = base_dn {
                config.base_dn = base_dn;
            }
            if let Some(output) = output {
                config.output = Some(output);
            }
            if let Some(schema) = schema {
                config.schema = schema;
            }
            run_chart(&cli.connection, &config, save_snapshot.as_deref()).await
        }
        Commands::Render { snapshot, output } => {
            if let Some(output) = output {
                config.output = Some(output);
            }
            let entries = load_snapshot(&snapshot)
                .with_context(|| format!("reading snapshot {}", snapshot.display()))?;
            write_chart(entries, config.output_path())
        }
        Commands::Members {
            list_dn,
            ldap_uri,
            format,
        } => {
            if let Some(uri) = ldap_uri {
                config.connection.uri = uri;
            }
            run_members(&cli.connection, &config.connection, &list_dn, &format).await
        }
    }
}

impl ConnectionArgs {
    fn apply(&self, connection: &mut ConnectionConfig) {
        if let Some(bind_dn) = &self.bind_dn {
            connection.bind_dn = Some(bind_dn.clone());
        }
        if let Some(password_file) = &self.password_file {
            connection.password_file = Some(password_file.clone());
        }
        if self.starttls {
            connection.starttls = true;
        }
        if let Some(ca_file) = &self.ca_file {
            connection.ca_file = Some(ca_file.clone());
        }
        if let Some(timeout) = self.timeout {
            connection.timeout_secs = timeout;
        }
    }

    /// Password file, then interactive prompt, then `--password`
    fn password(&self, connection: &ConnectionConfig) -> anyhow::Result<Option<String>> {
        if let Some(password) = connection
            .read_password()
            .context("reading password file")?
        {
            return Ok(Some(password));
        }
        if self.askpass {
            let password = Password::new()
                .with_prompt("Bind password")
                .allow_empty_password(true)
                .interact()
                .context("reading password from terminal")?;
            return Ok(Some(password));
        }
        Ok(self.password.clone())
    }

    /// Bind DN and password, or `None` for an anonymous session.
    ///
    /// No password source is consulted without a bind DN.
    fn credentials(&self, connection: &ConnectionConfig) -> anyhow::Result<Option<(String, String)>> {
        let Some(bind_dn) = connection.bind_dn.clone() else {
            return Ok(None);
        };
        Ok(self
            .password(connection)?
            .map(|password| (bind_dn, password)))
    }
}

async fn open_directory(
    args: &ConnectionArgs,
    connection: &ConnectionConfig,
) -> anyhow::Result<LdapDirectory> {
    connection.validate()?;
    let credentials = args.credentials(connection)?;

    let mut directory = LdapDirectory::connect(connection).await?;
    match credentials {
        Some((bind_dn, password)) => directory.bind(&bind_dn, &password).await?,
        None => debug!("No bind DN and password, continuing anonymously"),
    }
    Ok(directory)
}

async fn close_directory(directory: &mut LdapDirectory) {
    if let Err(e) = directory.close().await {
        debug!("Unbind from {} failed: {}", directory.uri(), e);
    }
}

async fn run_chart(
    args: &ConnectionArgs,
    config: &ChartConfig,
    save_snapshot: Option<&Path>,
) -> anyhow::Result<()> {
    config.validate()?;
    debug!(
        "uri={} base_dn={} schema={} starttls={} timeout={}",
        config.connection.uri,
        config.base_dn,
        config.schema,
        config.connection.starttls,
        config.connection.timeout_secs
    );

    let mut directory = open_directory(args, &config.connection).await?;
    let entries = fetch_entries(&mut directory, &config.base_dn, config.schema).await;
    close_directory(&mut directory).await;
    let entries = entries?;

    if let Some(path) = save_snapshot {
        save_snapshot_file(path, &entries)
            .with_context(|| format!("saving snapshot to {}", path.display()))?;
    }

    write_chart(entries, config.output_path())
}

fn write_chart(entries: Vec<RawEntry>, output: Option<&Path>) -> anyhow::Result<()> {
    let summary = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating output file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            generate_chart(entries, &mut writer)
                .with_context(|| format!("writing {}", path.display()))?
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            generate_chart(entries, &mut writer).context("writing to stdout")?
        }
    };

    info!(
        "Wrote chart: {} people, {} departments, {} managers",
        summary.records, summary.departments, summary.edge_groups
    );
    Ok(())
}

async fn run_members(
    args: &ConnectionArgs,
    connection: &ConnectionConfig,
    list_dn: &str,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut directory = open_directory(args, connection).await?;
    let members = list_members(&mut directory, list_dn).await;
    close_directory(&mut directory).await;

    let Some(members) = members? else {
        warn!("{} is not a group", list_dn);
        println!("No results returned");
        return Ok(());
    };

    print_members(&members, format)
}

fn print_members(members: &[Member], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(members)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Name", "DN"]);
            for member in members {
                table.add_row(vec![member.to_string(), member.dn.clone()]);
            }
            println!("{}", table);
            println!("{} member(s)", members.len());
        }
        OutputFormat::Plain => {
            for member in members {
                println!("{}", member);
            }
        }
    }
    Ok(())
}
