pub mod input_sim;
pub mod types;
pub mod xdotool;

/// Best-effort synthetic keyboard input. Failures are logged by the implementation and never
/// reach the caller, so a broken keystroke cannot stop later measurements.
#[allow(async_fn_in_trait)]
pub trait KeystrokeEmitter {
    async fn type_text(&mut self, text: &str);
    async fn press_enter(&mut self);
}
