//! The anchor is the first message of an event thread. Its embed is
//! the durable record for the event's roster: field 0 is the signup
//! notice, field 1 the Attending list, field 2 the Tentative list.
//! That fixed layout is a backward-compatibility contract with every
//! previously created anchor, so it is validated on load and never
//! reshaped on write.

pub const NOTICE_FIELD: usize = 0;
pub const ATTENDING_FIELD: usize = 1;
pub const TENTATIVE_FIELD: usize = 2;

pub const NOTICE_LABEL: &str = "__Note__";
pub const ATTENDING_LABEL: &str = "__Attending__";
pub const TENTATIVE_LABEL: &str = "__Tentative__";

const NOTICE_TEXT: &str = "Use the /event_signup command to register for the event.";

const EMBED_COLOR: u32 = 0x5865F2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl Embed {
    /// Builds a fresh event embed with empty roster lists.
    pub fn for_event(name: &str, description: &str) -> Self {
        Self {
            title: format!("__{name}__"),
            description: description.to_string(),
            color: EMBED_COLOR,
            fields: vec![
                EmbedField::new(NOTICE_LABEL, NOTICE_TEXT),
                EmbedField::new(ATTENDING_LABEL, ""),
                EmbedField::new(TENTATIVE_LABEL, ""),
            ],
            footer: None,
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    fn labeled_field(&self, index: usize, label: &str) -> Option<&EmbedField> {
        self.fields.get(index).filter(|field| field.name == label)
    }

    pub fn attending_text(&self) -> Option<&str> {
        self.labeled_field(ATTENDING_FIELD, ATTENDING_LABEL)
            .map(|field| field.value.as_str())
    }

    pub fn tentative_text(&self) -> Option<&str> {
        self.labeled_field(TENTATIVE_FIELD, TENTATIVE_LABEL)
            .map(|field| field.value.as_str())
    }

    /// True when the fixed-position roster fields are present and
    /// correctly labeled.
    pub fn has_roster_fields(&self) -> bool {
        self.attending_text().is_some() && self.tentative_text().is_some()
    }

    pub fn set_attending_text(&mut self, value: String) -> bool {
        self.set_field_value(ATTENDING_FIELD, ATTENDING_LABEL, value)
    }

    pub fn set_tentative_text(&mut self, value: String) -> bool {
        self.set_field_value(TENTATIVE_FIELD, TENTATIVE_LABEL, value)
    }

    fn set_field_value(&mut self, index: usize, label: &str, value: String) -> bool {
        match self.fields.get_mut(index) {
            Some(field) if field.name == label => {
                field.value = value;
                true
            }
            _ => false,
        }
    }
}

/// A loaded anchor message together with the store metadata the
/// adapter validates against: authorship and the owning thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub message_id: String,
    pub thread_id: String,
    pub thread_name: String,
    pub system_authored: bool,
    pub embed: Embed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_embed_lays_out_the_three_fields() {
        let embed = Embed::for_event("Raid Night", "Weekly clear");

        assert_eq!(embed.title, "__Raid Night__");
        assert_eq!(embed.fields.len(), 3);
        assert_eq!(embed.fields[NOTICE_FIELD].name, NOTICE_LABEL);
        assert_eq!(embed.fields[ATTENDING_FIELD].name, ATTENDING_LABEL);
        assert_eq!(embed.fields[TENTATIVE_FIELD].name, TENTATIVE_LABEL);
        assert_eq!(embed.attending_text(), Some(""));
        assert_eq!(embed.tentative_text(), Some(""));
    }

    #[test]
    fn roster_accessors_reject_missing_fields() {
        let embed = Embed::default();
        assert_eq!(embed.attending_text(), None);
        assert!(!embed.has_roster_fields());
    }

    #[test]
    fn roster_accessors_reject_mislabeled_fields() {
        let mut embed = Embed::for_event("Raid Night", "");
        embed.fields[ATTENDING_FIELD].name = "__Confirmed__".to_string();

        assert_eq!(embed.attending_text(), None);
        assert_eq!(embed.tentative_text(), Some(""));
        assert!(!embed.has_roster_fields());
    }

    #[test]
    fn roster_accessors_reject_swapped_positions() {
        let mut embed = Embed::for_event("Raid Night", "");
        embed.fields.swap(ATTENDING_FIELD, TENTATIVE_FIELD);
        assert!(!embed.has_roster_fields());
    }

    #[test]
    fn set_roster_text_writes_in_place() {
        let mut embed = Embed::for_event("Raid Night", "");
        assert!(embed.set_attending_text("PLD - Alice".to_string()));
        assert_eq!(embed.attending_text(), Some("PLD - Alice"));
        assert_eq!(embed.tentative_text(), Some(""));
    }

    #[test]
    fn set_roster_text_refuses_malformed_layout() {
        let mut embed = Embed::default();
        assert!(!embed.set_attending_text("PLD - Alice".to_string()));
    }

    #[test]
    fn footer_is_attached_without_touching_fields() {
        let embed = Embed::for_event("Raid Night", "").with_footer("ID: 42");
        assert_eq!(embed.footer.as_deref(), Some("ID: 42"));
        assert_eq!(embed.fields.len(), 3);
    }
}
