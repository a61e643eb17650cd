use anyhow::{Error, Result};
use clap::{arg, ArgMatches, Command};

use embrace::{Config, Outcome};

use crate::util;

pub fn cmd() -> Command {
    Command::new("image")
        .subcommand_required(true)
        .display_order(20)
        .about("Manage gallery images")
        .subcommand(
            Command::new("add")
                .arg_required_else_help(true)
                .about("Adds an image file to the gallery")
                .arg(arg!(<file> "Image file"))
                .arg(arg!(-p --prompt <prompt> "Prompt describing the image").default_value("")),
        )
        .subcommand(
            Command::new("get")
                .arg_required_else_help(true)
                .about("Prints a gallery image")
                .arg(arg!(<id> "Image id"))
                .arg(arg!(--json "Print the full record as json")),
        )
}

pub async fn run(matches: &ArgMatches, config: Config) -> Result<()> {
    let store = util::store(&config);

    let result = match matches.subcommand() {
        Some(("add", m)) => {
            let file = m.get_one::<String>("file").expect("required");
            let prompt = m.get_one::<String>("prompt").expect("defaulted");
            let data_uri = util::read_image(file).await?;
            match store.save_image(&data_uri, prompt).await {
                Outcome::Value(image) => {
                    println!("{}", image.id);
                    Ok(())
                }
                outcome => Err(Error::msg(format!("image not saved: {}", describe(&outcome)))),
            }
        }
        Some(("get", m)) => {
            let id = m.get_one::<String>("id").expect("required").parse()?;
            match store.image(id).await {
                Outcome::Value(image) if m.get_flag("json") => util::print_json(&image),
                Outcome::Value(image) => {
                    util::print_image(&image);
                    Ok(())
                }
                outcome => Err(Error::msg(describe(&outcome))),
            }
        }
        _ => unreachable!("subcommand is required"),
    };

    store.connections().disconnect().await;
    result
}

pub fn describe<T>(outcome: &Outcome<T>) -> String {
    match outcome.reason() {
        Some(reason) => reason.to_string(),
        None if outcome.value().is_none() => "not found".to_string(),
        None => "ok".to_string(),
    }
}
