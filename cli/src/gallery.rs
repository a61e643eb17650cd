use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};

use embrace::{Config, Gallery};

use crate::util;

pub fn cmd() -> Command {
    Command::new("gallery")
        .display_order(10)
        .about("List gallery images, newest first")
        .arg(
            Arg::new("preview")
                .long("preview")
                .short('p')
                .action(ArgAction::SetTrue)
                .help("Only show the preview images"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the gallery as json"),
        )
}

pub async fn run(matches: &ArgMatches, config: Config) -> Result<()> {
    let store = util::store(&config);
    let gallery = Gallery::new(store.clone(), &config.gallery);

    let snapshot = if matches.get_flag("preview") {
        gallery.preview_snapshot().await
    } else {
        gallery.snapshot().await
    };

    if matches.get_flag("json") {
        util::print_json(&snapshot)?;
    } else if let Some(reason) = &snapshot.reason {
        eprintln!("gallery unavailable: {reason}");
    } else if snapshot.images.is_empty() {
        println!("gallery is empty");
    } else {
        snapshot.images.iter().for_each(util::print_image);
    }

    store.connections().disconnect().await;
    Ok(())
}
