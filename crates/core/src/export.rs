//! Plain-text renderings of a conversation.

use std::fmt::Display;

use chrono::{NaiveDate, TimeZone};

use crate::conversation::Message;

const LOCALIZED_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Renders every message as its sender label, content and a localized
/// timestamp. Entries are separated by a blank line.
pub fn render_history<Tz>(messages: &[Message], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    messages
        .iter()
        .map(|msg| {
            let timestamp = msg.timestamp().with_timezone(tz);
            format!(
                "{}: {}\n{}",
                msg.sender().label(),
                msg.content(),
                timestamp.format(LOCALIZED_FORMAT)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders the conversation for sharing, without timestamps.
pub fn render_share(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}: {}", msg.sender().label(), msg.content()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Returns the file name an export made on `date` is saved as.
#[inline]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("vugasu-chat-{}.txt", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;
    use crate::conversation::Sender;

    fn messages() -> Vec<Message> {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        vec![
            Message::new("1", "Hello! How can I help?", Sender::Assistant, t0),
            Message::new(
                "2",
                "Do you have puppies?\nMales preferred.",
                Sender::User,
                t0 + chrono::Duration::seconds(30),
            ),
        ]
    }

    #[test]
    fn test_render_history() {
        let text = render_history(&messages(), &Utc);
        assert_eq!(
            text,
            "Assistant: Hello! How can I help?\n3/5/2024, 2:07:09 PM\n\n\
             You: Do you have puppies?\nMales preferred.\n3/5/2024, 2:07:39 PM"
        );
    }

    #[test]
    fn test_render_history_in_other_zone() {
        let tz = FixedOffset::west_opt(15 * 3600).unwrap();
        let text = render_history(&messages()[..1], &tz);
        assert!(text.ends_with("3/4/2024, 11:07:09 PM"));
    }

    #[test]
    fn test_render_share() {
        assert_eq!(
            render_share(&messages()),
            "Assistant: Hello! How can I help?\n\n\
             You: Do you have puppies?\nMales preferred."
        );
        assert_eq!(render_share(&[]), "");
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(export_file_name(date), "vugasu-chat-2024-03-05.txt");
    }
}
