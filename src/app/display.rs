// linux-armoury - app/display.rs
//
// Panel refresh rate control via xrandr. X11 only; the tool reads the
// connected primary output and drives its rate while keeping the current
// resolution.

use tracing::{debug, info};

use crate::core::parse;
use crate::platform::exec;
use crate::util::constants;
use crate::util::error::{DisplayError, Result};

#[derive(Debug, Clone, Default)]
pub struct DisplayManager {
    /// Forced output name from settings, bypassing auto-detection.
    output_override: Option<String>,
}

impl DisplayManager {
    pub fn new(output_override: Option<String>) -> Self {
        Self { output_override }
    }

    fn query(&self) -> Result<String> {
        let output = exec::run_checked(
            constants::CMD_XRANDR,
            &["--query"],
            constants::QUERY_TIMEOUT_MS,
        )
        .map_err(DisplayError::Exec)?;
        Ok(output.stdout)
    }

    /// The output the tool drives: the override if set, else the
    /// connected primary.
    pub fn target_output(&self) -> Result<String> {
        if let Some(name) = &self.output_override {
            return Ok(name.clone());
        }
        let stdout = self.query()?;
        parse::xrandr_primary_output(&stdout).ok_or_else(|| DisplayError::NoConnectedOutput.into())
    }

    /// Current refresh rate of the panel (Hz).
    pub fn current_refresh(&self) -> Result<u32> {
        let stdout = self.query()?;
        parse::xrandr_current_refresh(&stdout).ok_or_else(|| DisplayError::NoConnectedOutput.into())
    }

    /// Rates the panel offers at its current resolution.
    pub fn supported_rates(&self) -> Result<Vec<u32>> {
        let stdout = self.query()?;
        let rates = parse::xrandr_supported_rates(&stdout);
        if rates.is_empty() {
            return Err(DisplayError::NoConnectedOutput.into());
        }
        Ok(rates)
    }

    /// Switch the panel to the given rate, keeping the current resolution.
    pub fn set_refresh(&self, rate: u32) -> Result<()> {
        let stdout = self.query()?;

        let supported = parse::xrandr_supported_rates(&stdout);
        if !supported.is_empty() && !supported.contains(&rate) {
            return Err(DisplayError::UnsupportedRate { rate, supported }.into());
        }

        let output = match &self.output_override {
            Some(name) => name.clone(),
            None => parse::xrandr_primary_output(&stdout)
                .ok_or(DisplayError::NoConnectedOutput)?,
        };
        let (width, height) = parse::xrandr_current_resolution(&stdout)
            .ok_or(DisplayError::NoConnectedOutput)?;

        let mode = format!("{width}x{height}");
        let rate_str = rate.to_string();
        debug!(%output, %mode, rate, "setting refresh rate");
        exec::run_checked(
            constants::CMD_XRANDR,
            &[
                "--output", &output, "--mode", &mode, "--rate", &rate_str,
            ],
            constants::COMMAND_TIMEOUT_MS,
        )
        .map_err(DisplayError::Exec)?;
        info!(%output, rate, "refresh rate set");
        Ok(())
    }
}
