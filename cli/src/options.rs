//! Command-line options and their conversion into engine configurations

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use embedmongo_engine::domain::config::{CmdOptions, MongodConfig, MongosConfig, Storage};
use embedmongo_engine::domain::value_objects::{Net, Version};
use embedmongo_engine::infrastructure::{load_mongod_config, BIN_DIR_ENV};
use std::path::PathBuf;
use std::time::Duration;

/// Launch and inspect embedded MongoDB processes
#[derive(Parser, Debug)]
#[command(name = "embedmongo")]
#[command(about = "Launch and inspect embedded MongoDB processes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show which version-gated features a version has
    Features {
        /// Version number or alias (production, latest)
        version: String,
    },

    /// Print the command line a launch would use, without spawning
    CommandLine {
        #[command(subcommand)]
        target: CommandLineTarget,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        bin: BinDirArgs,
    },

    /// Start a mongod and keep it running until Ctrl-C
    Run(RunArgs),

    /// Start every mongod definition of a directory until Ctrl-C
    Up {
        /// Directory of YAML definitions
        #[arg(long, env = "EMBEDMONGO_CONFIG_DIR")]
        dir: PathBuf,

        #[command(flatten)]
        bin: BinDirArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum CommandLineTarget {
    Mongod(MongodArgs),
    Mongos(MongosArgs),
}

#[derive(Args, Debug)]
pub struct BinDirArgs {
    /// Directory of the extracted distribution
    #[arg(long, env = BIN_DIR_ENV)]
    pub bin_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML definition; replaces the mongod options below
    #[arg(long, conflicts_with_all = ["version", "port", "dbpath", "repl_set"])]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub mongod: MongodArgs,

    #[command(flatten)]
    pub bin: BinDirArgs,
}

/// Options shared by the server roles
#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Version number or alias (production, latest)
    #[arg(long, default_value = "production")]
    pub version: String,

    /// Port; a free one is picked when absent
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub bind_ip: Option<String>,

    #[arg(long)]
    pub ipv6: bool,

    #[arg(long)]
    pub verbose: bool,

    #[arg(long)]
    pub auth: bool,

    #[arg(long)]
    pub storage_engine: Option<String>,

    /// Seconds to wait for readiness
    #[arg(long, env = "EMBEDMONGO_STARTUP_TIMEOUT_SEC")]
    pub startup_timeout_sec: Option<u64>,

    /// Extra `--name value` arguments, as NAME=VALUE
    #[arg(long = "arg", value_parser = parse_key_val)]
    pub args: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct MongodArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Database directory; a temporary one is used when absent
    #[arg(long)]
    pub dbpath: Option<PathBuf>,

    #[arg(long)]
    pub repl_set: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub oplog_size: u32,

    /// Keep the journal on
    #[arg(long)]
    pub journal: bool,

    #[arg(long, conflicts_with = "shard_server")]
    pub config_server: bool,

    #[arg(long)]
    pub shard_server: bool,

    /// `--setParameter` pairs, as NAME=VALUE
    #[arg(long = "set-parameter", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    #[arg(long)]
    pub pid_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MongosArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Config servers, as host:port[,host:port]
    #[arg(long)]
    pub config_db: Option<String>,

    /// Replica set of the config servers
    #[arg(long, default_value = "")]
    pub replica_set: String,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid NAME=VALUE: no '=' found in '{}'", s))?;
    if key.is_empty() {
        return Err(format!("invalid NAME=VALUE: empty name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

impl ServerArgs {
    fn version(&self) -> Result<Version> {
        Version::parse(&self.version).with_context(|| format!("bad --version '{}'", self.version))
    }

    fn net(&self) -> Result<Net> {
        let port = match self.port {
            Some(port) => port,
            None => Net::free_port()?.port(),
        };
        Ok(Net::new(self.bind_ip.clone(), port, self.ipv6)?)
    }

    fn cmd_options(&self, journal: bool) -> CmdOptions {
        let mut builder = CmdOptions::builder()
            .verbose(self.verbose)
            .enable_auth(self.auth)
            .use_no_journal(!journal);
        if let Some(engine) = &self.storage_engine {
            builder = builder.storage_engine(engine);
        }
        builder.build()
    }

    fn startup_timeout(&self) -> Result<Option<Duration>> {
        match self.startup_timeout_sec {
            Some(0) => bail!("startup timeout must be greater than zero"),
            Some(secs) => Ok(Some(Duration::from_secs(secs))),
            None => Ok(None),
        }
    }
}

impl MongodArgs {
    pub fn into_config(self) -> Result<MongodConfig> {
        let server = &self.server;
        let storage = Storage::new(self.dbpath, self.repl_set, self.oplog_size)?;

        let mut builder = MongodConfig::builder(server.version()?, server.net()?)
            .cmd_options(server.cmd_options(self.journal))
            .storage(storage)
            .config_server(self.config_server)
            .shard_server(self.shard_server);
        if let Some(timeout) = server.startup_timeout()? {
            builder = builder.startup_timeout(timeout);
        }
        for (name, value) in self.params {
            builder = builder.set_parameter(name, value);
        }
        for (name, value) in &server.args {
            builder = builder.arg(name, value);
        }
        if let Some(pid_file) = self.pid_file {
            builder = builder.pid_file(pid_file);
        }
        Ok(builder.build()?)
    }
}

impl MongosArgs {
    pub fn into_config(self) -> Result<MongosConfig> {
        let server = &self.server;
        let mut builder = MongosConfig::builder(server.version()?, server.net()?)
            .cmd_options(server.cmd_options(false))
            .replica_set(self.replica_set);
        if let Some(config_db) = self.config_db {
            builder = builder.config_db(config_db);
        }
        if let Some(timeout) = server.startup_timeout()? {
            builder = builder.startup_timeout(timeout);
        }
        for (name, value) in &server.args {
            builder = builder.arg(name, value);
        }
        Ok(builder.build()?)
    }
}

impl RunArgs {
    pub fn into_config(self) -> Result<MongodConfig> {
        match self.config {
            Some(path) => load_mongod_config(&path)
                .with_context(|| format!("failed to load {}", path.display())),
            None => self.mongod.into_config(),
        }
    }
}
