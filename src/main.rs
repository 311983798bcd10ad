use std::path::{Path, PathBuf};

use clap::Parser;
use hako::{
    cli::{Args, ExecutablesConfig, parse_overrides, resolve_profiles},
    error::HakoError,
    install::install_default_profiles,
    policy::{
        ProfileLoader, ValueMap,
        merge::{merge_maps, normalize_map},
        merge_profiles,
    },
    runtime::execute_with_profile,
    sbpl::{self, ProfileParams},
};

#[tokio::main]
async fn main() -> Result<(), HakoError> {
    env_logger::init();

    let args = Args::parse();

    let home = std::env::var("HOME").unwrap_or_else(|_| "/".to_string());
    let config_dir = PathBuf::from(&home).join(".config").join("hako");
    let user_profiles = config_dir.join("profiles");
    let bundled_profiles = PathBuf::from(&home)
        .join(".local")
        .join("share")
        .join("hako")
        .join("profiles");

    if args.install_profiles {
        install_default_profiles(&bundled_profiles, args.force)?;
        return Ok(());
    }
    // Bundled defaults must be resolvable on first run
    install_default_profiles(&bundled_profiles, false)?;

    let (selected, cli_overrides) = parse_overrides(&args.selectors);

    // Per-executable defaults from the optional config table; explicit
    // CLI selections and overrides take precedence over them
    let mut selection: Vec<String> = Vec::new();
    let mut overrides = ValueMap::new();
    if let Some(command) = args.command.first() {
        let basename = Path::new(command)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(command);
        if let Some(config) = ExecutablesConfig::load(&config_dir.join("config.toml")) {
            for rule in config.matching_rules(basename) {
                selection.extend(rule.profiles.iter().cloned());
                overrides = merge_maps(overrides, rule.override_tree());
            }
        }
    }
    selection.extend(selected);
    let overrides = merge_maps(overrides, normalize_map(cli_overrides));

    let profiles = resolve_profiles(selection);
    let loader = ProfileLoader::new(&user_profiles, &bundled_profiles);
    let documents = loader.load_all(&profiles)?;

    let effective = merge_profiles(&documents, overrides);

    let params = ProfileParams {
        home: home.clone(),
        working_directory: std::env::current_dir()?.display().to_string(),
        config_dir: config_dir.display().to_string(),
    };
    let profile = sbpl::compile(&effective, &params);

    if args.print_profile {
        println!("{profile}");
        return Ok(());
    }

    let (command, command_args) = match args.command.split_first() {
        Some((command, rest)) => (command.clone(), rest.to_vec()),
        None => (
            std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string()),
            Vec::new(),
        ),
    };
    let command_args: Vec<&str> = command_args.iter().map(String::as_str).collect();

    let exit_code = execute_with_profile(&command, &command_args, &profile, &home).await?;
    std::process::exit(exit_code);
}
