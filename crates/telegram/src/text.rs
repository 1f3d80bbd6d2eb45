/// Telegram rejects messages longer than this (in bytes of UTF-8 here, which
/// is stricter than the API's UTF-16 count).
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Split `text` into pieces of at most `max_len` bytes, preferring to break
/// at a newline, then a space. Never splits inside a UTF-8 character.
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 {
        return Vec::new();
    }
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut window = remaining.floor_char_boundary(max_len);
        if window == 0 {
            window = remaining
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(remaining.len());
        }

        let slice = &remaining[..window];
        let split_at = match slice.rfind('\n').or_else(|| slice.rfind(' ')) {
            Some(0) | None => window,
            Some(i) => i,
        };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start_matches('\n');
        if let Some(rest) = remaining.strip_prefix(' ') {
            remaining = rest;
        }
    }

    chunks
}

/// If `text` is the bot command `command` (optionally addressed as
/// `/command@bot_username`), return the trimmed argument text.
pub fn parse_command<'a>(text: &'a str, command: &str, bot_username: Option<&str>) -> Option<&'a str> {
    let rest = text.trim_start().strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let (name, target) = match head.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (head, None),
    };
    if name != command {
        return None;
    }
    match (target, bot_username) {
        (None, _) => Some(args),
        (Some(target), Some(me)) if target.eq_ignore_ascii_case(me) => Some(args),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_message("hello", 10), vec!["hello"]);
    }

    #[test]
    fn splits_at_newline() {
        let chunks = chunk_message("aaaa\nbbbb\ncccc", 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn splits_at_space_without_newline() {
        let chunks = chunk_message("aaaa bbbb cccc", 10);
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn hard_split_when_no_break() {
        let chunks = chunk_message("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn never_splits_a_multibyte_char() {
        let text = "📨".repeat(5);
        let chunks = chunk_message(&text, 6);
        assert!(chunks.iter().all(|c| c.len() <= 6));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn long_notification_fits_telegram_limit() {
        let text = format!("📨 New message\nFrom: App\nTitle: t\nContent: {}", "x ".repeat(5000));
        let chunks = chunk_message(&text, TELEGRAM_MAX_MESSAGE_LEN);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= TELEGRAM_MAX_MESSAGE_LEN));
        assert!(chunks[0].starts_with("📨"));
    }

    #[rstest]
    #[case("/gotify_register", Some(""))]
    #[case("  /gotify_register  ", Some(""))]
    #[case("/gotify_register@herald_bot", Some(""))]
    #[case("/gotify_register@HERALD_BOT", Some(""))]
    #[case("/gotify_register now please", Some("now please"))]
    #[case("/gotify_register@other_bot", None)]
    #[case("/gotify_registered", None)]
    #[case("gotify_register", None)]
    #[case("/start", None)]
    #[case("", None)]
    fn command_parsing(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            parse_command(text, "gotify_register", Some("herald_bot")),
            expected
        );
    }

    #[test]
    fn addressed_command_without_known_username_is_ignored() {
        assert_eq!(parse_command("/gotify_register@x", "gotify_register", None), None);
    }
}
