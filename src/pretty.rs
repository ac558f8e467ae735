//! Terminal rendering for the `relay` binary.
//!
//! Everything writes to a caller-supplied [`Write`], so the same functions
//! drive stdout and the tests' in-memory buffers. Colors follow the chat
//! layout:
//!
//! - `User:` labels in bold green
//! - assistant replies in bold blue
//! - timestamps and descriptions in dark grey

use chrono::{DateTime, Utc};
use crossterm::{
    ExecutableCommand,
    style::{Attribute, Color, SetAttribute, SetForegroundColor},
};
use std::error::Error;
use std::io::Write;

use crate::catalog::ModelInfo;
use crate::conversation::{Conversation, relative_day};
use crate::message::{Message, Role};
use crate::settings::{PromptPreset, Settings};

fn styled<W: Write>(
    out: &mut W,
    color: Color,
    attribute: Attribute,
    text: &str,
) -> Result<(), Box<dyn Error>> {
    out.execute(SetForegroundColor(color))?;
    out.execute(SetAttribute(attribute))?;
    write!(out, "{text}")?;
    out.execute(SetAttribute(Attribute::Reset))?;
    out.execute(SetForegroundColor(Color::Reset))?;
    Ok(())
}

/// Print an assistant reply the way `ask` shows it.
pub fn print_reply<W: Write>(out: &mut W, reply: &Message) -> Result<(), Box<dyn Error>> {
    styled(out, Color::Blue, Attribute::Bold, &reply.content)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Print a whole transcript, one labelled block per message.
pub fn print_transcript<W: Write>(out: &mut W, messages: &[Message]) -> Result<(), Box<dyn Error>> {
    for message in messages {
        let color = match message.role {
            Role::User => Color::Green,
            Role::Assistant => Color::Blue,
            Role::System => Color::DarkGrey,
        };
        styled(out, color, Attribute::Bold, &format!("{}:", message.role.speaker()))?;
        writeln!(out)?;
        writeln!(out, "{}", message.content)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Print the sidebar: id, title, preview and relative day per conversation.
pub fn print_conversations<W: Write>(
    out: &mut W,
    conversations: &[Conversation],
    active: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    if conversations.is_empty() {
        writeln!(out, "No conversations yet")?;
        return Ok(());
    }

    for conversation in conversations {
        let marker = if active == Some(conversation.id.as_str()) {
            "*"
        } else {
            " "
        };
        write!(out, "{marker} {}  ", conversation.id)?;
        styled(out, Color::Reset, Attribute::Bold, &conversation.title)?;
        write!(out, "  ")?;
        styled(
            out,
            Color::DarkGrey,
            Attribute::Italic,
            &relative_day(conversation.timestamp, now),
        )?;
        writeln!(out)?;
        writeln!(out, "    {}", conversation.last_message)?;
    }
    out.flush()?;
    Ok(())
}

/// Print the model catalog, marking `selected`.
pub fn print_models<W: Write>(
    out: &mut W,
    models: &[ModelInfo],
    selected: &str,
) -> Result<(), Box<dyn Error>> {
    for model in models {
        let marker = if model.id == selected { "*" } else { " " };
        write!(out, "{marker} {:<28} {:<18} ", model.id, model.name)?;
        styled(out, Color::DarkGrey, Attribute::Italic, model.description)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Print the prompt presets, marking the one `current` matches.
pub fn print_presets<W: Write>(
    out: &mut W,
    presets: &[PromptPreset],
    current: &str,
) -> Result<(), Box<dyn Error>> {
    for preset in presets {
        let marker = if preset.prompt == current { "*" } else { " " };
        write!(out, "{marker} ")?;
        styled(out, Color::Reset, Attribute::Bold, preset.name)?;
        writeln!(out)?;
        writeln!(out, "    {}", preset.prompt)?;
    }
    out.flush()?;
    Ok(())
}

/// Print settings as YAML.
pub fn print_settings<W: Write>(out: &mut W, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let yaml = serde_yaml::to_string(settings)?;
    write!(out, "{yaml}")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MODELS;
    use crate::settings::PRESETS;
    use chrono::{Duration, TimeZone};

    fn rendered(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_print_reply_contains_content() {
        let mut buf = Vec::new();
        print_reply(&mut buf, &Message::assistant("Hello there")).unwrap();
        let text = rendered(buf);
        assert!(text.contains("Hello there"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_print_transcript_labels_speakers() {
        let mut buf = Vec::new();
        print_transcript(
            &mut buf,
            &[Message::user("Hi"), Message::assistant("Hello!")],
        )
        .unwrap();
        let text = rendered(buf);
        let user = text.find("User:").unwrap();
        let assistant = text.find("Assistant:").unwrap();
        assert!(user < assistant);
        assert!(text.contains("Hello!"));
    }

    #[test]
    fn test_print_conversations_marks_active() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let conversations = vec![
            Conversation {
                id: "2".into(),
                title: "Rust".into(),
                last_message: "Ownership...".into(),
                timestamp: now,
            },
            Conversation {
                id: "1".into(),
                title: "Old".into(),
                last_message: "bye".into(),
                timestamp: now - Duration::days(1),
            },
        ];

        let mut buf = Vec::new();
        print_conversations(&mut buf, &conversations, Some("2"), now).unwrap();
        let text = rendered(buf);
        assert!(text.contains("* 2  "));
        assert!(text.contains("  1  "));
        assert!(text.contains("Today"));
        assert!(text.contains("Yesterday"));
    }

    #[test]
    fn test_print_conversations_empty() {
        let mut buf = Vec::new();
        print_conversations(&mut buf, &[], None, Utc::now()).unwrap();
        assert_eq!(rendered(buf), "No conversations yet\n");
    }

    #[test]
    fn test_print_models_marks_selected() {
        let mut buf = Vec::new();
        print_models(&mut buf, MODELS, MODELS[0].id).unwrap();
        let text = rendered(buf);
        assert_eq!(text.lines().count(), MODELS.len());
        assert!(text.lines().next().unwrap().starts_with('*'));
    }

    #[test]
    fn test_print_settings_is_yaml() {
        let mut buf = Vec::new();
        print_settings(&mut buf, &Settings::default()).unwrap();
        let text = rendered(buf);
        assert!(text.contains("maxTokens: 4000"));
        assert!(text.contains("memoryEnabled: true"));
    }

    #[test]
    fn test_print_presets_marks_current() {
        let mut buf = Vec::new();
        print_presets(&mut buf, PRESETS, PRESETS[2].prompt).unwrap();
        let text = rendered(buf);
        let marked: Vec<_> = text.lines().filter(|line| line.starts_with('*')).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("Document Helper"));
    }
}
