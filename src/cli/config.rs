//! Conversion of CLI arguments into library configuration and panel events

use crate::cli::main_impl::Cli;
use crate::{
    config::{ExecutionProvider, RemoverConfig, SliderKind},
    models::ModelKind,
    processor::ProcessorConfig,
    settings::SettingsEvent,
};
use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Selected model, `u2net` when none was given
    pub(crate) fn model(cli: &Cli) -> Result<ModelKind> {
        match &cli.model {
            Some(name) => name.parse().context("Invalid --model"),
            None => Ok(ModelKind::default()),
        }
    }

    pub(crate) fn remover_config(cli: &Cli, model_path: PathBuf) -> Result<RemoverConfig> {
        let provider: ExecutionProvider = cli
            .execution_provider
            .parse()
            .context("Invalid execution provider")?;

        RemoverConfig::builder()
            .model(Self::model(cli)?)
            .model_path(model_path)
            .execution_provider(provider)
            .intra_threads(cli.threads)
            .build()
            .context("Invalid model configuration")
    }

    pub(crate) fn processor_config(cli: &Cli) -> Result<ProcessorConfig> {
        ProcessorConfig::builder()
            .jpeg_quality(cli.jpeg_quality)
            .build()
            .context("Invalid processor configuration")
    }

    /// Flags replayed as settings panel interactions
    ///
    /// The panel starts with defaults on, so the slider flags only take effect
    /// after `--custom` switched them off.
    pub(crate) fn settings_events(cli: &Cli) -> Vec<SettingsEvent> {
        let mut events = Vec::new();
        if cli.custom {
            events.push(SettingsEvent::ToggleDefaults(false));
            for (kind, value) in Self::slider_flags(cli) {
                if let Some(value) = value {
                    events.push(SettingsEvent::SliderMoved(kind, value));
                }
            }
        }
        events.push(SettingsEvent::FormatSelected(cli.format.into()));
        events
    }

    fn slider_flags(cli: &Cli) -> [(SliderKind, Option<u32>); 3] {
        [
            (SliderKind::SmoothEdges, cli.smooth),
            (SliderKind::ResizePercent, cli.resize),
            (SliderKind::UpscaleFactor, cli.upscale),
        ]
    }

    /// Reject values the panel would otherwise clamp silently
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        cli.execution_provider
            .parse::<ExecutionProvider>()
            .context("Invalid execution provider")?;
        Self::model(cli)?;
        Self::processor_config(cli)?;

        for (kind, value) in Self::slider_flags(cli) {
            if let Some(value) = value {
                let (min, max) = kind.range();
                if !(min..=max).contains(&value) {
                    anyhow::bail!("{} must be between {} and {}, got {}", kind.label(), min, max, value);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["bgremover-pro"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_events_only_select_format() {
        let cli = parse(&["a.png"]);
        assert_eq!(
            CliConfigBuilder::settings_events(&cli),
            vec![SettingsEvent::FormatSelected(OutputFormat::Png)]
        );
    }

    #[test]
    fn test_custom_events() {
        let cli = parse(&["--custom", "--resize", "50", "--upscale", "2", "-f", "webp", "a.png"]);
        assert_eq!(
            CliConfigBuilder::settings_events(&cli),
            vec![
                SettingsEvent::ToggleDefaults(false),
                SettingsEvent::SliderMoved(SliderKind::ResizePercent, 50),
                SettingsEvent::SliderMoved(SliderKind::UpscaleFactor, 2),
                SettingsEvent::FormatSelected(OutputFormat::WebP),
            ]
        );
    }

    #[test]
    fn test_validation() {
        assert!(CliConfigBuilder::validate_cli(&parse(&["a.png"])).is_ok());
        assert!(CliConfigBuilder::validate_cli(&parse(&["-e", "tpu", "a.png"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["-m", "sam", "a.png"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["--jpeg-quality", "0", "a.png"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["--custom", "--resize", "300", "a.png"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["--custom", "--smooth", "5", "a.png"])).is_ok());
    }

    #[test]
    fn test_model_selection() {
        assert_eq!(CliConfigBuilder::model(&parse(&["a.png"])).unwrap(), ModelKind::U2Net);
        assert_eq!(
            CliConfigBuilder::model(&parse(&["-m", "isnet-general-use", "a.png"])).unwrap(),
            ModelKind::IsNetGeneralUse
        );
    }

    #[test]
    fn test_remover_config_requires_existing_model_file() {
        let cli = parse(&["-e", "cpu", "a.png"]);
        assert!(CliConfigBuilder::remover_config(&cli, PathBuf::from("/nonexistent/u2net.onnx")).is_err());

        let temp = tempfile::NamedTempFile::new().unwrap();
        let config = CliConfigBuilder::remover_config(&cli, temp.path().to_path_buf()).unwrap();
        assert_eq!(config.execution_provider, ExecutionProvider::Cpu);
        assert_eq!(config.model, ModelKind::U2Net);
    }
}
