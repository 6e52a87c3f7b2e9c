// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

mod app;
mod commands;

use app::AppState;

fn build_cli() -> Command {
    Command::new("shelfsort")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sorts downloaded audiobooks into an Author/Series/Title library")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml and state files")
                .global(true),
        )
        .arg(
            Arg::new("downloads")
                .long("downloads")
                .value_name("DIR")
                .help("Downloads root (overrides config)")
                .global(true),
        )
        .arg(
            Arg::new("library")
                .long("library")
                .value_name("DIR")
                .help("Library root (overrides config)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log more; repeat for trace output")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print machine-readable JSON")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("scan")
                .about("List candidate book units in the downloads root")
                .arg(refresh_arg()),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify downloaded units against the library and history")
                .arg(refresh_arg())
                .arg(
                    Arg::new("status")
                        .short('s')
                        .long("status")
                        .value_name("STATUS")
                        .help("Only show units with this status")
                        .value_parser(["untidy", "built", "match", "done"]),
                ),
        )
        .subcommand(
            Command::new("process")
                .about("Place one confirmed unit into the library")
                .arg(
                    Arg::new("unit")
                        .required(true)
                        .value_name("UNIT")
                        .help("Fingerprint prefix or name of the unit"),
                )
                .arg(
                    Arg::new("title")
                        .short('t')
                        .long("title")
                        .value_name("TITLE")
                        .help("Book title"),
                )
                .arg(
                    Arg::new("author")
                        .short('a')
                        .long("author")
                        .value_name("AUTHOR")
                        .help("Book author"),
                )
                .arg(
                    Arg::new("narrator")
                        .short('n')
                        .long("narrator")
                        .value_name("NARRATOR")
                        .help("Narrator"),
                )
                .arg(
                    Arg::new("series")
                        .long("series")
                        .value_name("SERIES")
                        .help("Series name"),
                )
                .arg(
                    Arg::new("part")
                        .long("part")
                        .value_name("NUMBER")
                        .help("Position in the series, may be fractional")
                        .value_parser(clap::value_parser!(f32)),
                )
                .arg(
                    Arg::new("cover")
                        .long("cover")
                        .value_name("PATH")
                        .help("Cover image to embed"),
                )
                .arg(
                    Arg::new("asin")
                        .long("asin")
                        .value_name("ASIN")
                        .help("Catalog identifier"),
                )
                .arg(
                    Arg::new("no-lookup")
                        .long("no-lookup")
                        .help("Skip the metadata resolver and use the flags only")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("delete-sources")
                        .long("delete-sources")
                        .help("Remove emptied source folders afterwards")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("copy")
                        .long("copy")
                        .help("Copy instead of move")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("move"),
                )
                .arg(
                    Arg::new("move")
                        .long("move")
                        .help("Move even if config says copy")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Show the planned destination without touching files")
                        .action(ArgAction::SetTrue),
                )
                .arg(refresh_arg()),
        )
        .subcommand(Command::new("index").about("List books found in the library root"))
        .subcommand(
            Command::new("history")
                .about("Inspect or edit the processing history")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List processed units"))
                .subcommand(
                    Command::new("forget")
                        .about("Drop a history record so the unit is classified again")
                        .arg(
                            Arg::new("fingerprint")
                                .required(true)
                                .value_name("FINGERPRINT")
                                .help("Fingerprint or unique prefix"),
                        ),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config.toml if missing"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the config file location")),
        )
}

fn refresh_arg() -> Arg {
    Arg::new("refresh")
        .short('r')
        .long("refresh")
        .help("Ignore the scan cache")
        .action(ArgAction::SetTrue)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let state = AppState::from_matches(&matches).context("Failed to load configuration")?;
    state.init_logging(matches.get_count("verbose"));
    let json = matches.get_flag("json");

    match matches.subcommand() {
        Some(("scan", sub)) => commands::scan(&state, sub, json),
        Some(("classify", sub)) => commands::classify(&state, sub, json),
        Some(("process", sub)) => commands::process(&state, sub, json).await,
        Some(("index", _)) => commands::show_index(&state, json),
        Some(("history", sub)) => match sub.subcommand() {
            Some(("list", _)) => commands::history_list(&state, json),
            Some(("forget", args)) => commands::history_forget(&state, args),
            _ => unreachable!("subcommand_required"),
        },
        Some(("config", sub)) => match sub.subcommand() {
            Some(("init", _)) => commands::config_init(&state),
            Some(("show", _)) => commands::config_show(&state),
            Some(("path", _)) => {
                println!("{}", state.config_manager.config_path().display());
                Ok(())
            }
            _ => unreachable!("subcommand_required"),
        },
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_process_args_parse() {
        let matches = build_cli()
            .try_get_matches_from([
                "shelfsort", "process", "abc123", "--title", "Dune", "--part", "1.5", "--copy",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "process");
        assert_eq!(sub.get_one::<String>("unit").unwrap(), "abc123");
        assert_eq!(sub.get_one::<f32>("part"), Some(&1.5));
        assert!(sub.get_flag("copy"));
    }

    #[test]
    fn test_copy_conflicts_with_move() {
        let result =
            build_cli().try_get_matches_from(["shelfsort", "process", "x", "--copy", "--move"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["shelfsort", "classify", "--json", "-vv", "--library", "/books"])
            .unwrap();
        assert!(matches.get_flag("json"));
        assert_eq!(matches.get_count("verbose"), 2);
        assert_eq!(matches.get_one::<String>("library").unwrap(), "/books");
    }
}
