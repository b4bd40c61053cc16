use anyhow::Result;

// Truncate all "yes", "no" responses for interactive prompt to just "y" or "n".
const INTERACTIVE_RESPONSE_LEN: usize = 1;
const YES: &str = "y";
const NO: &str = "n";

// For interactively handling destructive commands (and discouraging accidental deletes).
// Input like "yes", "Yes", "no", "No" will be accepted.
pub fn confirm(prompt_string: &str) -> Result<bool> {
    println!("{} [y/n]", prompt_string);
    let response: String = read!("{}\n");
    parse_response(response)
}

fn parse_response(response: String) -> Result<bool> {
    let mut response: String = response.split_whitespace().collect();
    response.make_ascii_lowercase();
    response.truncate(INTERACTIVE_RESPONSE_LEN);
    match response.as_ref() {
        YES => Ok(true),
        NO => Ok(false),
        _ => anyhow::bail!("Response must either be \"y\" for yes or \"n\" for no"),
    }
}
