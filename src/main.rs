use anyhow::Result;
use plparam::cli;
use plparam::main_entry::SessionConfigBuilder;

fn main() -> Result<()> {
    env_logger::init();

    let mut builder = SessionConfigBuilder::default();
    if let Ok(value) = std::env::var("PLPARAM_VARIABLE_PARAMS") {
        builder.variable_params(value != "off" && value != "false");
    }
    if let Ok(value) = std::env::var("PLPARAM_MAX_PARAMS") {
        builder.max_params(value.parse()?);
    }
    let session = plparam::Session::new(builder.build()?);
    cli::interactive(session)?;
    Ok(())
}
