//! `sample-config` command implementation.

/// Execute the `sample-config` command
pub fn run_sample_config() {
    print!("{}", dispatcher::SAMPLE_CONFIG);
}
