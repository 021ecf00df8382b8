use std::path::Path;

use clap::Parser;

mod bitbucket;
mod command;
mod config;
mod data;
mod error;
mod git;
mod github;
mod inspect;
mod issues;
mod output;
mod payload;
mod platform;
#[cfg(test)]
mod testing;

use config::Config;

fn main() {
    let config = Config::parse();
    let repo = Path::new(".");

    let payload = match payload::generate(&config, repo) {
        Ok(payload) => payload,
        Err(err) => {
            output::error(&err.to_string());
            std::process::exit(1);
        }
    };

    println!("{}", "=".repeat(50));
    output::print_summary(&payload, &config.output_path);
}
