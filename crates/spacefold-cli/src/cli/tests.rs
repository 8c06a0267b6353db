use super::*;
use clap::Parser;

#[test]
fn global_options_precede_the_command() {
    let cli = Cli::try_parse_from([
        "spacefold",
        "--root",
        "/notes",
        "--cache",
        "/tmp/spaces.db",
        "scan",
        "--spaces",
        "spaces.json",
    ])
    .expect("parse");
    assert_eq!(cli.root, PathBuf::from("/notes"));
    assert_eq!(cli.cache, Some(PathBuf::from("/tmp/spaces.db")));
    match cli.command {
        Commands::Scan(ScanArgs { spaces }) => {
            assert_eq!(spaces, Some(PathBuf::from("spaces.json")));
        }
        _ => panic!("expected scan command"),
    }
}

#[test]
fn root_defaults_to_current_directory() {
    let cli = Cli::try_parse_from(["spacefold", "uri", "spaces://Projects"]).expect("parse");
    assert_eq!(cli.root, PathBuf::from("."));
    assert!(cli.cache.is_none());
    match cli.command {
        Commands::Uri(UriArg { uri }) => assert_eq!(uri, "spaces://Projects"),
        _ => panic!("expected uri command"),
    }
}

#[test]
fn cache_subcommands_take_a_kind() {
    let cli = Cli::try_parse_from(["spacefold", "cache", "clean", "paths"]).expect("parse");
    match cli.command {
        Commands::Cache(CacheArgs {
            command: CacheCommand::Clean { kind },
        }) => assert_eq!(kind, "paths"),
        _ => panic!("expected cache clean command"),
    }
    assert!(Cli::try_parse_from(["spacefold", "cache", "list"]).is_err());
}

#[test]
fn members_requires_a_space() {
    assert!(Cli::try_parse_from(["spacefold", "members"]).is_err());
    let cli = Cli::try_parse_from(["spacefold", "members", "spaces://#todo"]).expect("parse");
    match cli.command {
        Commands::Members(MembersArgs { space, spaces }) => {
            assert_eq!(space, "spaces://#todo");
            assert!(spaces.is_none());
        }
        _ => panic!("expected members command"),
    }
}

#[test]
fn commands_name_their_operation() {
    let cli = Cli::try_parse_from(["spacefold", "--cache", "c.db", "cache", "clean", "paths"])
        .expect("parse");
    assert_eq!(cli.command.operation(), "cache.clean");
    let cli = Cli::try_parse_from(["spacefold", "members", "Projects"]).expect("parse");
    assert_eq!(cli.command.operation(), "members");
}
