/// Compiles a layout file and prints every view with its fields
use clap::*;
use log::Level;

use memview::prelude::v1::*;

fn main() -> Result<()> {
    let matches = parse_args();
    let (path, view_name) = extract_args(&matches)?;

    let registry = LayoutRegistry::open(path)?;

    let mut views = registry
        .views()
        .filter(|view| view_name.map_or(true, |name| view.name() == name))
        .collect::<Vec<_>>();
    views.sort_by(|a, b| a.name().cmp(b.name()));

    if views.is_empty() {
        return Err(Error(ErrorOrigin::View, ErrorKind::NotFound)
            .log_error(format_args!("no view matches {:?}", view_name)));
    }

    for view in views {
        match view.size() {
            Some(size) => println!("{} (0x{:x} bytes)", view.name(), size),
            None => println!("{} (unsized)", view.name()),
        }

        for field in view.fields() {
            let specialization = field.specialization();
            println!(
                "  {:<16} {:<24} {:<10} {:<24} {:?}",
                field.name(),
                field.declared().to_string(),
                format!("{:?}", specialization.category()),
                format!("{:?}", field.resolver()),
                specialization.capabilities(),
            );
        }
    }

    Ok(())
}

fn parse_args() -> ArgMatches {
    Command::new("layout_info example")
        .version(crate_version!())
        .arg(Arg::new("verbose").short('v').action(ArgAction::Count))
        .arg(
            Arg::new("layout")
                .long("layout")
                .short('l')
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new("view")
                .long("view")
                .action(ArgAction::Set)
                .required(false),
        )
        .get_matches()
}

fn extract_args(matches: &ArgMatches) -> Result<(&str, Option<&str>)> {
    let log_level = match matches.get_count("verbose") {
        0 => Level::Error,
        1 => Level::Warn,
        2 => Level::Info,
        3 => Level::Debug,
        4 => Level::Trace,
        _ => Level::Trace,
    };
    simplelog::TermLogger::init(
        log_level.to_level_filter(),
        simplelog::Config::default(),
        simplelog::TerminalMode::Stdout,
        simplelog::ColorChoice::Auto,
    )
    .unwrap();

    Ok((
        matches
            .get_one::<String>("layout")
            .map(String::as_str)
            .ok_or(Error(ErrorOrigin::Other, ErrorKind::Configuration))?,
        matches.get_one::<String>("view").map(String::as_str),
    ))
}
