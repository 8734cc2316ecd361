use std::env;

use termion::color;

/// `user@cwd$ `, or `#` instead of `$` for root.
pub fn render(colored: bool) -> String {
    let cwd = match env::current_dir() {
        Ok(x) => x.display().to_string(),
        Err(e) => format!("(error: {})", e),
    };
    let username = users::get_current_username()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("(none)"));
    let last_character = if users::get_current_uid() == 0 { "#" } else { "$" };
    if colored {
        format!(
            "{red}{username}{reset}@{green}{cwd}{reset}{last_character} ",
            red = color::Fg(color::Red),
            green = color::Fg(color::Green),
            reset = color::Fg(color::Reset),
            username = username,
            cwd = cwd,
            last_character = last_character
        )
    } else {
        format!("{}@{}{} ", username, cwd, last_character)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prompt_ends_with_marker() {
        let prompt = render(false);
        assert!(prompt.ends_with("$ ") || prompt.ends_with("# "));
        assert!(prompt.contains('@'));
        assert!(!prompt.contains('\u{1b}'));
    }

    #[test]
    fn colored_prompt_has_escapes() {
        assert!(render(true).contains('\u{1b}'));
    }
}
