//! Command-line synthesis
//!
//! One pure function per role turns an immutable configuration into the
//! argument vector for the resolved executable. Flags are grouped and emitted
//! in a fixed order, so identical inputs always give identical output.
//! Version-gated flags are silently dropped when the feature set lacks them.

use crate::domain::config::{
    DumpConfig, ImportConfig, MongodConfig, MongosConfig, RestoreConfig, RoleConfig, ShellConfig,
};
use crate::domain::value_objects::{CommandLine, CommandLineBuilder, Feature, FeatureSet, Net};
use crate::domain::{DomainError, Result};
use std::path::Path;
use tracing::debug;

/// Builds the command line for any role
///
/// `data_dir` is only consulted for the server role and overrides the
/// database directory of its storage settings.
pub fn synthesize(
    config: &RoleConfig,
    executable: &Path,
    data_dir: Option<&Path>,
    features: &FeatureSet,
) -> Result<CommandLine> {
    let command_line = match config {
        RoleConfig::Mongod(c) => mongod(c, executable, data_dir, features)?,
        RoleConfig::Mongos(c) => mongos(c, executable, features)?,
        RoleConfig::Dump(c) => mongodump(c, executable),
        RoleConfig::Restore(c) => mongorestore(c, executable),
        RoleConfig::Import(c) => mongoimport(c, executable),
        RoleConfig::Shell(c) => mongo_shell(c, executable),
    };

    debug!(
        role = %config.role(),
        version = %features.version(),
        command_line = %command_line,
        "Synthesized command line"
    );
    Ok(command_line)
}

pub fn mongod(
    config: &MongodConfig,
    executable: &Path,
    data_dir: Option<&Path>,
    features: &FeatureSet,
) -> Result<CommandLine> {
    let db_path = data_dir
        .or(config.storage.database_dir.as_deref())
        .ok_or_else(|| {
            DomainError::InvalidConfiguration("mongod requires a database directory".to_string())
        })?;
    let options = &config.cmd_options;

    let mut cmd = CommandLineBuilder::new(executable.display().to_string());
    cmd.option("--dbpath", db_path.display());
    cmd.flag_if(features.enabled(Feature::HttpInterfaceArg), "--nohttpinterface");

    cmd.flag(if options.auth { "--auth" } else { "--noauth" });
    if features.enabled(Feature::MmapV1Options) {
        cmd.flag_if(options.no_prealloc, "--noprealloc");
        cmd.flag_if(options.small_files, "--smallfiles");
    }
    // config servers must keep their journal
    cmd.flag_if(options.no_journal && !config.config_server, "--nojournal");
    cmd.flag_if(
        options.master && features.enabled(Feature::MasterSlave),
        "--master",
    );
    cmd.flag_if(options.verbose, "-v");

    server_net(&mut cmd, &config.net);

    cmd.option_if_some("--replSet", config.storage.repl_set_name.as_deref());
    if config.storage.oplog_size > 0 {
        cmd.option("--oplogSize", config.storage.oplog_size);
    }

    cmd.flag_if(config.config_server, "--configsvr");
    cmd.flag_if(config.shard_server, "--shardsvr");

    if features.enabled(Feature::StorageEngine) {
        cmd.option_if_some("--storageEngine", options.storage_engine.as_deref());
    }
    if features.enabled(Feature::SyncDelay) {
        if let Some(delay) = options.sync_delay {
            cmd.token(format!("--syncdelay={}", delay));
        }
    }
    if options.enable_text_search && features.enabled(Feature::TextSearch) {
        cmd.option("--setParameter", "textSearchEnabled=true");
    }

    for (name, value) in &config.params {
        cmd.option("--setParameter", format!("{}={}", name, value));
    }
    cmd.extra_args(&config.args);

    Ok(cmd.build())
}

pub fn mongos(config: &MongosConfig, executable: &Path, features: &FeatureSet) -> Result<CommandLine> {
    let config_db = match config.config_db.as_deref() {
        Some(db) if features.enabled(Feature::ConfigDbReplicaSetSyntax) => {
            if config.replica_set.trim().is_empty() {
                return Err(DomainError::InvalidConfiguration(format!(
                    "mongos {} requires the replica set name of its config servers",
                    features.version()
                )));
            }
            Some(format!("{}/{}", config.replica_set, db))
        }
        Some(db) => Some(db.to_string()),
        None => None,
    };

    let mut cmd = CommandLineBuilder::new(executable.display().to_string());
    if features.enabled(Feature::ChunkSizeArg) {
        cmd.option("--chunkSize", 1);
    }
    cmd.flag_if(config.cmd_options.verbose, "-v");
    cmd.flag_if(features.enabled(Feature::HttpInterfaceArg), "--nohttpinterface");

    server_net(&mut cmd, &config.net);

    cmd.option_if_some("--configdb", config_db);
    cmd.extra_args(&config.args);

    Ok(cmd.build())
}

pub fn mongodump(config: &DumpConfig, executable: &Path) -> CommandLine {
    let mut cmd = CommandLineBuilder::new(executable.display().to_string());
    cmd.flag_if(config.verbose, "-v");
    utility_net(&mut cmd, &config.net);

    cmd.option_if_some("--db", config.database.as_deref())
        .option_if_some("--collection", config.collection.as_deref())
        .option_if_some("--query", config.query.as_deref())
        .option_if_some("--queryFile", config.query_file.as_deref().map(Path::display))
        .option_if_some("--readPreference", config.read_preference.as_deref())
        .flag_if(config.force_table_scan, "--forceTableScan");
    // a bare --archive streams to stdout, so the path is attached with '='
    if let Some(archive) = &config.archive {
        cmd.token(format!("--archive={}", archive.display()));
    }
    cmd.flag_if(config.dump_db_users_and_roles, "--dumpDbUsersAndRoles")
        .option_if_some("--out", config.out.as_deref().map(Path::display))
        .flag_if(config.gzip, "--gzip")
        .flag_if(config.repair, "--repair")
        .flag_if(config.oplog, "--oplog")
        .option_if_some("--excludeCollection", config.exclude_collection.as_deref())
        .option_if_some(
            "--excludeCollectionsWithPrefix",
            config.exclude_collection_with_prefix.as_deref(),
        )
        .option("--numParallelCollections", config.num_parallel_collections);

    cmd.build()
}

pub fn mongorestore(config: &RestoreConfig, executable: &Path) -> CommandLine {
    let mut cmd = CommandLineBuilder::new(executable.display().to_string());
    cmd.flag_if(config.verbose, "-v");
    utility_net(&mut cmd, &config.net);

    cmd.option_if_some("--db", config.database.as_deref())
        .option_if_some("--collection", config.collection.as_deref())
        .flag_if(config.obj_check, "--objCheck")
        .flag_if(config.oplog_replay, "--oplogReplay")
        .option_if_some("--oplogLimit", config.oplog_limit.as_deref());
    if let Some(archive) = &config.archive {
        cmd.token(format!("--archive={}", archive.display()));
    }
    cmd.flag_if(config.restore_db_users_and_roles, "--restoreDbUsersAndRoles")
        .option_if_some("--dir", config.dir.as_deref().map(Path::display))
        .flag_if(config.gzip, "--gzip")
        .flag_if(config.drop, "--drop")
        .option_if_some("--writeConcern", config.write_concern.as_deref())
        .flag_if(config.no_index_restore, "--noIndexRestore")
        .flag_if(config.no_options_restore, "--noOptionsRestore")
        .flag_if(config.keep_index_version, "--keepIndexVersion")
        .flag_if(config.maintain_insertion_order, "--maintainInsertionOrder")
        .option("--numParallelCollections", config.num_parallel_collections)
        .option(
            "--numInsertionWorkersPerCollection",
            config.num_insertion_workers_per_collection,
        )
        .flag_if(config.stop_on_error, "--stopOnError")
        .flag_if(config.bypass_document_validation, "--bypassDocumentValidation");

    cmd.build()
}

pub fn mongoimport(config: &ImportConfig, executable: &Path) -> CommandLine {
    let mut cmd = CommandLineBuilder::new(executable.display().to_string());
    cmd.flag_if(config.verbose, "-v");
    utility_net(&mut cmd, &config.net);

    cmd.option("--db", &config.database)
        .option("--collection", &config.collection)
        .option_if_some("--type", config.file_type.as_deref())
        .option_if_some("--fields", config.fields.as_deref())
        .flag_if(config.header_line, "--headerline")
        .flag_if(config.json_array, "--jsonArray")
        .flag_if(config.upsert, "--upsert")
        .flag_if(config.drop, "--drop")
        .flag_if(config.stop_on_error, "--stopOnError")
        .option_if_some("--file", config.file.as_deref().map(Path::display));

    cmd.build()
}

pub fn mongo_shell(config: &ShellConfig, executable: &Path) -> CommandLine {
    let mut cmd = CommandLineBuilder::new(executable.display().to_string());
    // a user name alone would make the shell prompt for a password
    let password = config.password.as_deref().filter(|p| !p.is_empty());
    let username = password.and(config.username.as_deref().filter(|u| !u.is_empty()));
    cmd.option_if_some("--username", username)
        .option_if_some("--password", password);

    let host = config.net.bind_ip().unwrap_or("localhost");
    match config.database.as_deref().filter(|db| !db.is_empty()) {
        Some(db) => cmd.token(format!("{}:{}/{}", host, config.net.port(), db)),
        None => cmd.token(format!("{}:{}", host, config.net.port())),
    };

    if !config.script_parameters.is_empty() {
        let script: String = config
            .script_parameters
            .iter()
            .map(|p| format!("{}; ", p))
            .collect();
        cmd.option("--eval", script);
    }
    if let Some(script) = &config.script_name {
        cmd.token(script.display().to_string());
    }

    cmd.build()
}

fn server_net(cmd: &mut CommandLineBuilder, net: &Net) {
    cmd.option("--port", net.port());
    cmd.option_if_some("--bind_ip", net.bind_ip());
    cmd.flag_if(net.ipv6(), "--ipv6");
}

fn utility_net(cmd: &mut CommandLineBuilder, net: &Net) {
    cmd.option("--port", net.port());
    cmd.option_if_some("--host", net.bind_ip());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{CmdOptions, Storage};
    use crate::domain::value_objects::Version;
    use std::path::PathBuf;

    const MONGOD: &str = "/opt/mongo/bin/mongod";
    const MONGOS: &str = "/opt/mongo/bin/mongos";

    fn net() -> Net {
        Net::on_port(27017).unwrap()
    }

    fn tokens(cmd: &CommandLine) -> Vec<&str> {
        cmd.tokens().iter().map(String::as_str).collect()
    }

    fn mongod_line(config: &MongodConfig) -> CommandLine {
        mongod(
            config,
            Path::new(MONGOD),
            Some(Path::new("/tmp/db")),
            &config.version.features(),
        )
        .unwrap()
    }

    #[test]
    fn test_mongod_legacy_version() {
        let config = MongodConfig::builder(Version::new(3, 2, 0), net())
            .build()
            .unwrap();
        let cmd = mongod_line(&config);

        assert_eq!(
            tokens(&cmd),
            vec![
                MONGOD,
                "--dbpath",
                "/tmp/db",
                "--nohttpinterface",
                "--noauth",
                "--noprealloc",
                "--smallfiles",
                "--nojournal",
                "--port",
                "27017",
                "--syncdelay=0",
            ]
        );
    }

    #[test]
    fn test_mongod_modern_version_drops_removed_flags() {
        let options = CmdOptions::builder().storage_engine("wiredTiger").build();
        let config = MongodConfig::builder(Version::new(4, 4, 0), net())
            .cmd_options(options)
            .build()
            .unwrap();
        let cmd = mongod_line(&config);

        assert!(!cmd.contains("--nohttpinterface"));
        assert!(!cmd.contains("--noprealloc"));
        assert!(!cmd.contains("--smallfiles"));
        assert!(cmd.contains("--nojournal"));
        let t = tokens(&cmd);
        let pos = t.iter().position(|s| *s == "--storageEngine").unwrap();
        assert_eq!(t[pos + 1], "wiredTiger");
    }

    #[test]
    fn test_text_search_gated_by_version() {
        let options = CmdOptions::builder().enable_text_search(true).build();
        let enabled = MongodConfig::builder(Version::new(2, 4, 10), net())
            .cmd_options(options.clone())
            .build()
            .unwrap();
        let disabled = MongodConfig::builder(Version::new(3, 6, 5), net())
            .cmd_options(options)
            .build()
            .unwrap();

        assert!(mongod_line(&enabled).contains("textSearchEnabled=true"));
        assert!(!mongod_line(&disabled).contains("textSearchEnabled=true"));
    }

    #[test]
    fn test_storage_engine_and_sync_delay_gated_by_version() {
        let options = CmdOptions::builder()
            .storage_engine("mmapv1")
            .sync_delay(Some(5))
            .build();
        let config = MongodConfig::builder(Version::new(2, 0, 0), net())
            .cmd_options(options)
            .build()
            .unwrap();
        let cmd = mongod_line(&config);

        assert!(!cmd.contains("--storageEngine"));
        assert!(!cmd.contains("--syncdelay=5"));
    }

    #[test]
    fn test_config_server_keeps_journal() {
        let options = CmdOptions::builder().use_no_journal(true).build();
        let config = MongodConfig::builder(Version::new(3, 6, 5), net())
            .cmd_options(options)
            .config_server(true)
            .build()
            .unwrap();
        let cmd = mongod_line(&config);

        assert!(cmd.contains("--configsvr"));
        assert!(!cmd.contains("--nojournal"));
    }

    #[test]
    fn test_bind_ip_only_when_configured() {
        let config = MongodConfig::builder(Version::new(3, 6, 5), net())
            .build()
            .unwrap();
        assert!(!mongod_line(&config).contains("--bind_ip"));

        let bound = Net::new(Some("127.0.0.1".to_string()), 27017, true).unwrap();
        let config = MongodConfig::builder(Version::new(3, 6, 5), bound)
            .build()
            .unwrap();
        let cmd = mongod_line(&config);
        let t = tokens(&cmd);
        let pos = t.iter().position(|s| *s == "--bind_ip").unwrap();
        assert_eq!(t[pos + 1], "127.0.0.1");
        assert!(cmd.contains("--ipv6"));
    }

    #[test]
    fn test_replication_and_parameters() {
        let storage = Storage::new(None, Some("rs0".to_string()), 128).unwrap();
        let config = MongodConfig::builder(Version::new(3, 6, 5), net())
            .storage(storage)
            .set_parameter("enableTestCommands", "1")
            .arg("--quiet", "")
            .arg("--slowms", "50")
            .build()
            .unwrap();
        let cmd = mongod_line(&config);
        let t = tokens(&cmd);

        let repl = t.iter().position(|s| *s == "--replSet").unwrap();
        assert_eq!(t[repl + 1], "rs0");
        let oplog = t.iter().position(|s| *s == "--oplogSize").unwrap();
        assert_eq!(t[oplog + 1], "128");
        let param = t.iter().position(|s| *s == "enableTestCommands=1").unwrap();
        assert_eq!(t[param - 1], "--setParameter");
        assert_eq!(&t[t.len() - 3..], &["--quiet", "--slowms", "50"]);
    }

    #[test]
    fn test_mongod_uses_storage_dir_without_override() {
        let storage = Storage::new(Some(PathBuf::from("/data/db")), None, 0).unwrap();
        let config = MongodConfig::builder(Version::new(3, 6, 5), net())
            .storage(storage)
            .build()
            .unwrap();
        let cmd = mongod(&config, Path::new(MONGOD), None, &config.version.features()).unwrap();
        assert_eq!(tokens(&cmd)[2], "/data/db");
    }

    #[test]
    fn test_mongod_requires_database_dir() {
        let config = MongodConfig::builder(Version::new(3, 6, 5), net())
            .build()
            .unwrap();
        let result = mongod(&config, Path::new(MONGOD), None, &config.version.features());
        assert!(matches!(result, Err(DomainError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let storage = Storage::new(None, Some("rs0".to_string()), 64).unwrap();
        let config: RoleConfig = MongodConfig::builder(Version::new(3, 6, 5), net())
            .storage(storage)
            .set_parameter("a", "1")
            .set_parameter("b", "2")
            .build()
            .unwrap()
            .into();
        let features = config.version().features();
        let first = synthesize(&config, Path::new(MONGOD), Some(Path::new("/tmp/db")), &features)
            .unwrap();
        let second = synthesize(&config, Path::new(MONGOD), Some(Path::new("/tmp/db")), &features)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_router_requires_replica_set_name() {
        let config = MongosConfig::builder(Version::new(3, 6, 5), net())
            .config_db("localhost:27019")
            .build()
            .unwrap();
        let result = mongos(&config, Path::new(MONGOS), &config.version.features());
        assert!(matches!(result, Err(DomainError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_router_embeds_replica_set_in_configdb() {
        let config = MongosConfig::builder(Version::new(3, 6, 5), net())
            .config_db("localhost:27019")
            .replica_set("csrs")
            .build()
            .unwrap();
        let cmd = mongos(&config, Path::new(MONGOS), &config.version.features()).unwrap();
        let t = tokens(&cmd);

        assert!(!cmd.contains("--chunkSize"));
        assert_eq!(&t[t.len() - 2..], &["--configdb", "csrs/localhost:27019"]);
    }

    #[test]
    fn test_router_without_config_db() {
        let config = MongosConfig::builder(Version::new(3, 6, 5), net())
            .build()
            .unwrap();
        let cmd = mongos(&config, Path::new(MONGOS), &config.version.features()).unwrap();

        assert!(!cmd.contains("--configdb"));
        assert_eq!(tokens(&cmd), vec![MONGOS, "--port", "27017"]);
    }

    #[test]
    fn test_legacy_router() {
        let config = MongosConfig::builder(Version::new(3, 2, 0), net())
            .config_db("localhost:27019")
            .build()
            .unwrap();
        let cmd = mongos(&config, Path::new(MONGOS), &config.version.features()).unwrap();

        assert_eq!(
            tokens(&cmd),
            vec![
                MONGOS,
                "--chunkSize",
                "1",
                "--nohttpinterface",
                "--port",
                "27017",
                "--configdb",
                "localhost:27019",
            ]
        );
    }

    #[test]
    fn test_dump_arguments() {
        let bound = Net::new(Some("127.0.0.1".to_string()), 27018, false).unwrap();
        let config = DumpConfig::builder(Version::new(4, 0, 0), bound)
            .database("shop")
            .collection("orders")
            .archive("/tmp/shop.archive")
            .gzip(true)
            .build()
            .unwrap();
        let cmd = mongodump(&config, Path::new("/bin/mongodump"));

        assert_eq!(
            tokens(&cmd),
            vec![
                "/bin/mongodump",
                "--port",
                "27018",
                "--host",
                "127.0.0.1",
                "--db",
                "shop",
                "--collection",
                "orders",
                "--archive=/tmp/shop.archive",
                "--gzip",
                "--numParallelCollections",
                "4",
            ]
        );
    }

    #[test]
    fn test_restore_arguments() {
        let config = RestoreConfig::builder(Version::new(4, 0, 0), net())
            .dir("/tmp/dump")
            .drop_collections(true)
            .oplog_replay(true)
            .build()
            .unwrap();
        let cmd = mongorestore(&config, Path::new("/bin/mongorestore"));
        let t = tokens(&cmd);

        assert!(cmd.contains("--drop"));
        assert!(cmd.contains("--oplogReplay"));
        let dir = t.iter().position(|s| *s == "--dir").unwrap();
        assert_eq!(t[dir + 1], "/tmp/dump");
        assert_eq!(
            &t[t.len() - 4..],
            &[
                "--numParallelCollections",
                "4",
                "--numInsertionWorkersPerCollection",
                "1"
            ]
        );
    }

    #[test]
    fn test_import_arguments() {
        let config = ImportConfig::builder(Version::new(4, 0, 0), net(), "shop", "items")
            .file_type("json")
            .json_array(true)
            .upsert(true)
            .file("/tmp/items.json")
            .build()
            .unwrap();
        let cmd = mongoimport(&config, Path::new("/bin/mongoimport"));

        assert_eq!(
            tokens(&cmd),
            vec![
                "/bin/mongoimport",
                "--port",
                "27017",
                "--db",
                "shop",
                "--collection",
                "items",
                "--type",
                "json",
                "--jsonArray",
                "--upsert",
                "--file",
                "/tmp/items.json",
            ]
        );
    }

    #[test]
    fn test_shell_arguments() {
        let config = ShellConfig::builder(Version::new(4, 0, 0), net())
            .database("admin")
            .credentials("root", "secret")
            .eval("db.stats()")
            .eval("quit()")
            .build()
            .unwrap();
        let cmd = mongo_shell(&config, Path::new("/bin/mongo"));

        assert_eq!(
            tokens(&cmd),
            vec![
                "/bin/mongo",
                "--username",
                "root",
                "--password",
                "secret",
                "localhost:27017/admin",
                "--eval",
                "db.stats(); quit(); ",
            ]
        );
    }

    #[test]
    fn test_shell_credentials_need_a_password() {
        let mut config = ShellConfig::builder(Version::new(4, 0, 0), net())
            .credentials("root", "")
            .build()
            .unwrap();
        let cmd = mongo_shell(&config, Path::new("/bin/mongo"));
        assert!(!cmd.contains("--username"));
        assert!(!cmd.contains("--password"));

        config.password = None;
        let cmd = mongo_shell(&config, Path::new("/bin/mongo"));
        assert_eq!(tokens(&cmd), vec!["/bin/mongo", "localhost:27017"]);
    }
}
