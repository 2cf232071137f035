use anyhow::bail;
use folio_config::Config;

pub fn check_config(config: &Config, verbose: bool) -> anyhow::Result<()> {
    if verbose {
        println!("{config:#?}");
    }

    let problems = config.problems();
    if !problems.is_empty() {
        bail!(
            "Contact messages cannot be delivered reliably:\n  - {}",
            problems.join("\n  - ")
        );
    }

    println!("Config is valid.");

    Ok(())
}
