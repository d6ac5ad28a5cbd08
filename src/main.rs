mod rsa;

pub use crate::rsa::*;
pub use crate::rsa::config::set_silent;

use std::error::Error;
use clap::Parser;

fn main() -> Result<(), Box<dyn Error>> {
    let rsa = RSA::parse();
    set_silent(rsa.silent);
    if !rsa.silent { println!("Run args: {:?}", rsa); }
    rsa.run()?;
    Ok(())
}
