use anyhow::{Error, Result};
use clap::{arg, ArgMatches, Command};

use embrace::{Config, Outcome};

use crate::image::describe;
use crate::util;

pub fn cmd() -> Command {
    Command::new("memory")
        .subcommand_required(true)
        .display_order(30)
        .about("Inspect and replace memory images")
        .subcommand(
            Command::new("get")
                .arg_required_else_help(true)
                .about("Prints the current image of a memory")
                .arg(arg!(<memory_id> "Memory id"))
                .arg(arg!(--json "Print the full record as json")),
        )
        .subcommand(
            Command::new("set")
                .arg_required_else_help(true)
                .about("Replaces the image of a memory")
                .arg(arg!(<memory_id> "Memory id"))
                .arg(arg!(<file> "Image file"))
                .arg(arg!(-p --prompt <prompt> "Prompt describing the image").default_value("")),
        )
}

pub async fn run(matches: &ArgMatches, config: Config) -> Result<()> {
    let store = util::store(&config);

    let result = match matches.subcommand() {
        Some(("get", m)) => {
            let memory_id = m.get_one::<String>("memory_id").expect("required");
            match store.memory_image(memory_id).await {
                Outcome::Value(image) if m.get_flag("json") => util::print_json(&image),
                Outcome::Value(image) => {
                    util::print_image(&image);
                    Ok(())
                }
                Outcome::NotFound => {
                    println!("no image for memory {memory_id}");
                    Ok(())
                }
                outcome => Err(Error::msg(describe(&outcome))),
            }
        }
        Some(("set", m)) => {
            let memory_id = m.get_one::<String>("memory_id").expect("required");
            let file = m.get_one::<String>("file").expect("required");
            let prompt = m.get_one::<String>("prompt").expect("defaulted");
            let data_uri = util::read_image(file).await?;
            match store.save_memory_image(memory_id, &data_uri, prompt).await {
                Outcome::Value(image) => {
                    println!("{}", image.id);
                    Ok(())
                }
                outcome => Err(Error::msg(format!(
                    "memory image not saved: {}",
                    describe(&outcome)
                ))),
            }
        }
        _ => unreachable!("subcommand is required"),
    };

    store.connections().disconnect().await;
    result
}
