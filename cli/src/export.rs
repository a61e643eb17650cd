use anyhow::{Error, Result};
use clap::{Arg, ArgMatches, Command};

use embrace::{Config, Outcome};

use crate::image::describe;
use crate::util;

pub fn cmd() -> Command {
    Command::new("export")
        .about("Export a collection from the database as json")
        .display_order(70)
        .arg(
            Arg::new("collection")
                .display_order(11)
                .value_parser(["images", "memories"])
                .help("Provide collection name")
                .required(true),
        )
}

pub async fn run(matches: &ArgMatches, config: Config) -> Result<()> {
    let store = util::store(&config);

    let collection = matches.get_one::<String>("collection").expect("required");
    let outcome = match collection.as_str() {
        "images" => store.images().await,
        "memories" => store.memory_images().await,
        _ => unreachable!("restricted by value parser"),
    };
    store.connections().disconnect().await;

    match outcome {
        Outcome::Value(images) => util::print_json(&images),
        Outcome::NotFound => util::print_json(&Vec::<embrace::StoredImage>::new()),
        outcome => Err(Error::msg(format!(
            "couldn't export {collection}: {}",
            describe(&outcome)
        ))),
    }
}
