//! Output formatting for command results.

mod helpers;
mod state;
mod traits;

use serde::Serialize;

pub(crate) use helpers::porcelain_field;
pub(crate) use state::{BootstrapInfo, DecodedTx, ReplayInfo, RollbackInfo, RootInfo};
pub(crate) use traits::Formattable;

use crate::cli::OutputFormat;

/// Renders `value` in the requested format.
pub(crate) fn render<T: Formattable + Serialize>(
    value: &T,
    format: OutputFormat,
) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Porcelain => value.format_porcelain(),
    })
}

/// Prints `value` to stdout in the requested format.
pub(crate) fn output<T: Formattable + Serialize>(
    value: &T,
    format: OutputFormat,
) -> anyhow::Result<()> {
    println!("{}", render(value, format)?);
    Ok(())
}
