pub mod clock;
pub mod constants;
pub mod prompts;
#[cfg(test)]
pub mod test_helpers;
pub mod types;
