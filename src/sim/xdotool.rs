use log::debug;
use tokio::process::Command;

use crate::error::KeystrokeError;

const XDOTOOL: &str = "xdotool";

async fn run(args: &[&str]) -> Result<(), KeystrokeError> {
    debug!("Running {} {:?}", XDOTOOL, args);

    let status = Command::new(XDOTOOL)
        .args(args)
        .status()
        .await
        .map_err(|source| KeystrokeError::Spawn { tool: XDOTOOL, source })?;

    if !status.success() {
        return Err(KeystrokeError::ToolFailed { tool: XDOTOOL, status });
    }

    Ok(())
}

pub async fn type_text(text: &str) -> Result<(), KeystrokeError> {
    run(&["type", text]).await
}

pub async fn press_enter() -> Result<(), KeystrokeError> {
    run(&["key", "Return"]).await
}
