pub mod run;
pub mod secrets;

/// `--batch-mode`, which also defaults on when `JX_BATCH_MODE=true`
pub fn batch_mode(flag: bool) -> bool {
    flag || std::env::var("JX_BATCH_MODE").map_or(false, |v| v == "true")
}
