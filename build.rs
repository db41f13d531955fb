// in build.rs
use clap_complete::{
    generate_to,
    shells::{Bash, Zsh},
};
use std::env;
use std::io;

include!("src/cli.rs");

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    let out_dir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(out_dir) => out_dir,
    };

    let mut app = make_cli_app();
    for name in ["rustyplot", "rp"] {
        generate_to(Bash, &mut app, name, &out_dir)?;
        generate_to(Zsh, &mut app, name, &out_dir)?;
    }
    Ok(())
}
