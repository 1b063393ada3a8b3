use crate::config::Config;

pub fn cmd_show_config(config: &Config) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(&config.redacted())?;
    println!("{rendered}");
    Ok(())
}
