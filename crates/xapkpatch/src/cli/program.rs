use crate::apk::Toolchain;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::patch::{NetworkConfigSource, PatchSet};
use crate::pipeline::{Outcome, Pipeline, PipelineOptions};
use crate::tool::ProcessRunner;
use crate::tui::pause::PromptResume;
use crate::workspace::InterruptCleanup;
use tracing::debug;

/// Merges the command line with the configuration file.
pub fn pipeline_options(cli: &Cli, config: &Config) -> PipelineOptions {
    let patches = PatchSet::from_flags(
        cli.network_fix || config.patches.network_fix,
        cli.extract_native_libs || config.patches.extract_native_libs,
    );

    let network_config = match &config.patches.network_security_config {
        Some(path) => NetworkConfigSource::File(path.clone()),
        None => NetworkConfigSource::Builtin,
    };

    PipelineOptions {
        patches,
        network_config,
        pause: cli.pause,
        install: cli.install,
        allow_resign: cli.allow_resign(config.signing.allow_resign),
        workspace_base: None,
    }
}

pub fn program(cli: &Cli) -> Result<Outcome> {
    let config = Config::load(cli.config.as_deref())?;
    let options = pipeline_options(cli, &config);
    debug!("Options: {:?}", options);

    let toolchain = Toolchain::resolve(&config.tools, options.install)?;
    let interrupt = InterruptCleanup::install()?;

    Pipeline::new(toolchain, options, ProcessRunner, PromptResume)
        .with_interrupt_cleanup(interrupt)
        .run(&cli.input_xapk)
}
