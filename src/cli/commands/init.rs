use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("Created default config.toml - add provider API keys before resolving.");
    } else {
        println!("config.toml already exists, leaving it alone.");
    }
    Ok(())
}
